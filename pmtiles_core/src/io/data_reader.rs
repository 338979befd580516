//! This module defines the `DataReaderTrait`, the byte-range source every archive is read from.
//!
//! # Overview
//!
//! A source answers range requests and reports an identity token (ETag) for the resource it
//! served. Callers that already know the identity of the archive pass it along as
//! `expected_etag`; a source that observes a different identity fails with
//! [`DataReaderError::EtagMismatch`] so the caller can drop stale state and retry.
//!
//! # Examples
//!
//! ```rust
//! use pmtiles_core::{io::{DataReader, DataReaderBlob}, ByteRange};
//! use anyhow::Result;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let reader: DataReader = Arc::new(DataReaderBlob::from(vec![1, 2, 3, 4, 5]));
//!
//!     let response = reader.read_range(&ByteRange::new(1, 3), None).await?;
//!     assert_eq!(response.blob.as_slice(), &[2, 3, 4]);
//!
//!     Ok(())
//! }
//! ```

use crate::{Blob, ByteRange};
use anyhow::Result;
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

/// Type alias for a shared dynamic implementation of the `DataReaderTrait`.
pub type DataReader = Arc<dyn DataReaderTrait>;

/// The bytes of one range request plus the response metadata a source could observe.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RangeResponse {
	pub blob: Blob,
	/// Strong identity token of the resource, if the source knows one.
	pub etag: Option<String>,
	pub cache_control: Option<String>,
	pub expires: Option<String>,
}

impl RangeResponse {
	pub fn new(blob: Blob) -> Self {
		Self {
			blob,
			..Default::default()
		}
	}

	pub fn with_etag(mut self, etag: Option<String>) -> Self {
		self.etag = etag;
		self
	}
}

/// Failures a source reports in a form callers can tell apart.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DataReaderError {
	/// The resource changed between requests.
	#[error("server returned non-matching ETag: expected {expected:?}, got {actual:?}")]
	EtagMismatch { expected: Option<String>, actual: Option<String> },

	#[error("bad response code: {0}")]
	Status(u16),

	#[error(
		"server returned no content-length header or content-length exceeding request; check that the storage backend supports HTTP byte serving"
	)]
	NoByteServing,
}

impl DataReaderError {
	/// Searches the error chain of `err` for a `DataReaderError`.
	pub fn find(err: &anyhow::Error) -> Option<&DataReaderError> {
		err.chain().find_map(|e| e.downcast_ref::<DataReaderError>())
	}

	/// Returns `true` if `err` was caused by an identity mismatch.
	pub fn is_etag_mismatch(err: &anyhow::Error) -> bool {
		matches!(Self::find(err), Some(DataReaderError::EtagMismatch { .. }))
	}

	/// Fails with `EtagMismatch` if both tokens are known and differ.
	pub fn check_etag(expected: Option<&str>, actual: Option<&str>) -> Result<(), DataReaderError> {
		match (expected, actual) {
			(Some(expected), Some(actual)) if expected != actual => Err(DataReaderError::EtagMismatch {
				expected: Some(expected.to_string()),
				actual: Some(actual.to_string()),
			}),
			_ => Ok(()),
		}
	}
}

/// A trait for reading byte ranges from various sources.
#[async_trait]
pub trait DataReaderTrait: Debug + Send + Sync {
	/// Reads a range of bytes.
	///
	/// A range reaching past the end of the source is truncated. If `expected_etag` is given
	/// and the source can tell that the resource now has a different identity, the call fails
	/// with [`DataReaderError::EtagMismatch`].
	async fn read_range(&self, range: &ByteRange, expected_etag: Option<&str>) -> Result<RangeResponse>;

	/// The name of the source; used as cache key, so it must identify the resource.
	fn get_name(&self) -> &str;
}
