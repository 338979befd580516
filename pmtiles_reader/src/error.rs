//! Typed failures of the archive reader.
//!
//! Errors travel as [`anyhow::Error`]. Conditions that callers need to tell apart are
//! [`PMTilesError`] values somewhere in the error chain, or [`DataReaderError`] values raised by
//! the byte-range sources. Errors produced by a computation that several callers share are
//! wrapped in a [`SharedError`], so lookups descend into it.

use crate::{PMTilesCompression, cache::SharedError};
use pmtiles_core::io::DataReaderError;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PMTilesError {
	#[error("wrong magic number for PMTiles archive")]
	WrongMagicNumber,

	#[error("archive is spec version {0}, but this reader only supports versions up to 3")]
	UnsupportedVersion(u8),

	#[error("empty directory is invalid")]
	EmptyDirectory,

	#[error("compression method {0:?} is not supported")]
	UnsupportedCompression(PMTilesCompression),

	#[error("tile zoom level {0} exceeds the maximum zoom level 26")]
	ZoomOutOfRange(u8),

	#[error("tile {x}/{y} is outside the bounds of zoom level {z}")]
	TileOutOfBounds { z: u8, x: u32, y: u32 },

	#[error("maximum directory depth exceeded")]
	MaxDepthExceeded,
}

impl PMTilesError {
	/// Searches the error chain of `err` for a `PMTilesError`.
	pub fn find(err: &anyhow::Error) -> Option<&PMTilesError> {
		find_in_chain(err)
	}
}

/// Returns `true` if `err` was caused by the archive changing while it was read.
pub fn is_etag_mismatch(err: &anyhow::Error) -> bool {
	matches!(
		find_in_chain::<DataReaderError>(err),
		Some(DataReaderError::EtagMismatch { .. })
	)
}

pub(crate) fn find_in_chain<T>(err: &anyhow::Error) -> Option<&T>
where
	T: std::error::Error + 'static,
{
	for cause in err.chain() {
		if let Some(found) = cause.downcast_ref::<T>() {
			return Some(found);
		}
		if let Some(shared) = cause.downcast_ref::<SharedError>() {
			return find_in_chain(shared.inner());
		}
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;
	use anyhow::Context;

	#[test]
	fn find_through_context() {
		let err = anyhow::Error::from(PMTilesError::EmptyDirectory).context("reading leaf directory");
		assert_eq!(PMTilesError::find(&err), Some(&PMTilesError::EmptyDirectory));
		assert_eq!(PMTilesError::find(&anyhow::anyhow!("something else")), None);
	}

	#[test]
	fn find_through_shared_error() {
		let inner = anyhow::Error::from(DataReaderError::EtagMismatch {
			expected: Some("a".to_string()),
			actual: Some("b".to_string()),
		});
		let shared = SharedError::from(inner);
		let err = Err::<(), _>(shared.clone()).context("fetching header").unwrap_err();
		assert!(is_etag_mismatch(&err));
		assert!(is_etag_mismatch(&anyhow::Error::from(shared)));

		let other = anyhow::Error::from(SharedError::from(anyhow::Error::from(PMTilesError::MaxDepthExceeded)));
		assert!(!is_etag_mismatch(&other));
		assert_eq!(PMTilesError::find(&other), Some(&PMTilesError::MaxDepthExceeded));
	}

	#[test]
	fn messages() {
		assert_eq!(
			PMTilesError::TileOutOfBounds { z: 1, x: 2, y: 0 }.to_string(),
			"tile 2/0 is outside the bounds of zoom level 1"
		);
		assert_eq!(
			PMTilesError::UnsupportedCompression(PMTilesCompression::Zstd).to_string(),
			"compression method Zstd is not supported"
		);
	}
}
