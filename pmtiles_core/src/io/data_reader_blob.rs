//! This module provides functionality for reading data from in-memory blobs.
//!
//! The blob may carry an identity token that can be replaced at runtime, which makes the
//! reader suitable for simulating an archive that changes while it is being read.

use super::{DataReaderError, DataReaderTrait, RangeResponse};
use crate::{Blob, ByteRange};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;

/// A struct that provides reading capabilities from an in-memory blob of data.
#[derive(Debug)]
pub struct DataReaderBlob {
	name: String,
	blob: Blob,
	etag: RwLock<Option<String>>,
}

impl DataReaderBlob {
	pub fn new(name: &str, blob: Blob) -> Self {
		Self {
			name: name.to_string(),
			blob,
			etag: RwLock::new(None),
		}
	}

	pub fn with_etag(self, etag: &str) -> Self {
		self.set_etag(Some(etag));
		self
	}

	/// Replaces the identity token reported with every response.
	pub fn set_etag(&self, etag: Option<&str>) {
		*self.etag.write() = etag.map(str::to_string);
	}

	pub fn len(&self) -> u64 {
		self.blob.len()
	}

	pub fn is_empty(&self) -> bool {
		self.blob.is_empty()
	}
}

impl From<Vec<u8>> for DataReaderBlob {
	fn from(value: Vec<u8>) -> Self {
		DataReaderBlob::new("memory", Blob::from(value))
	}
}

impl From<Blob> for DataReaderBlob {
	fn from(value: Blob) -> Self {
		DataReaderBlob::new("memory", value)
	}
}

#[async_trait]
impl DataReaderTrait for DataReaderBlob {
	async fn read_range(&self, range: &ByteRange, expected_etag: Option<&str>) -> Result<RangeResponse> {
		let etag = self.etag.read().clone();
		DataReaderError::check_etag(expected_etag, etag.as_deref())?;
		Ok(RangeResponse::new(self.blob.read_range_truncated(range)).with_etag(etag))
	}

	fn get_name(&self) -> &str {
		&self.name
	}
}
