//! Decompression dispatch on the compression tags of the header.

use crate::{PMTilesCompression, PMTilesError};
use anyhow::{Result, bail};
use pmtiles_core::{
	Blob,
	compression::{decompress_brotli, decompress_gzip},
};
use std::sync::Arc;

/// A function turning stored bytes into plain bytes, given the compression they were stored with.
pub type Decompressor = Arc<dyn Fn(Blob, PMTilesCompression) -> Result<Blob> + Send + Sync>;

/// Decompresses with the built-in codecs.
///
/// `Unknown` and `None` pass the data through unchanged.
///
/// # Errors
/// Fails with [`PMTilesError::UnsupportedCompression`] for Zstd, and if the data is corrupt.
pub fn decompress(blob: Blob, compression: PMTilesCompression) -> Result<Blob> {
	match compression {
		PMTilesCompression::Unknown | PMTilesCompression::None => Ok(blob),
		PMTilesCompression::Gzip => decompress_gzip(&blob),
		PMTilesCompression::Brotli => decompress_brotli(&blob),
		PMTilesCompression::Zstd => bail!(PMTilesError::UnsupportedCompression(compression)),
	}
}

pub fn default_decompressor() -> Decompressor {
	Arc::new(decompress)
}

#[cfg(test)]
mod tests {
	use super::*;
	use pmtiles_core::compression::{compress_brotli, compress_gzip};

	#[test]
	fn pass_through() -> Result<()> {
		let blob = Blob::from("plain");
		assert_eq!(decompress(blob.clone(), PMTilesCompression::None)?, blob);
		assert_eq!(decompress(blob.clone(), PMTilesCompression::Unknown)?, blob);
		Ok(())
	}

	#[test]
	fn gzip_and_brotli() -> Result<()> {
		let blob = Blob::from("a tile, compressed twice");
		assert_eq!(decompress(compress_gzip(&blob)?, PMTilesCompression::Gzip)?, blob);
		assert_eq!(decompress(compress_brotli(&blob)?, PMTilesCompression::Brotli)?, blob);
		Ok(())
	}

	#[test]
	fn zstd_is_unsupported() {
		let err = default_decompressor()(Blob::from("x"), PMTilesCompression::Zstd).unwrap_err();
		assert_eq!(
			PMTilesError::find(&err),
			Some(&PMTilesError::UnsupportedCompression(PMTilesCompression::Zstd))
		);
	}
}
