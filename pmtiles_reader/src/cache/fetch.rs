//! Reading and decoding of headers and directories, shared by both cache implementations.

use crate::{Decompressor, Directory, HeaderV3, PMTilesCompression};
use anyhow::{Context, Result};
use pmtiles_core::{Blob, ByteRange, io::DataReader};

/// Number of bytes read when bootstrapping an archive. Writers place the root directory right
/// after the header, so it usually arrives with the same request.
pub const HEADER_PREFIX_LENGTH: u64 = 16384;

pub fn header_key(source: &DataReader) -> String {
	source.get_name().to_string()
}

pub fn directory_key(source: &DataReader, range: &ByteRange, etag: Option<&str>) -> String {
	format!(
		"{}|{}|{}|{}",
		source.get_name(),
		etag.unwrap_or_default(),
		range.offset,
		range.length
	)
}

/// Reads the first bytes of the archive and decodes the header. If the root directory lies within
/// these bytes it is decoded as well and returned with its cache key.
pub async fn fetch_header_and_root(
	source: &DataReader,
	decompressor: &Decompressor,
) -> Result<(HeaderV3, Option<(String, Directory)>)> {
	log::trace!("fetching header of '{}'", source.get_name());

	let response = source
		.read_range(&ByteRange::new(0, HEADER_PREFIX_LENGTH), None)
		.await
		.with_context(|| format!("reading header of '{}'", source.get_name()))?;
	let header = HeaderV3::deserialize(&response.blob, response.etag)
		.with_context(|| format!("decoding header of '{}'", source.get_name()))?;
	log::trace!("header: {header:?}");

	let root_end = header.root_dir.checked_end().context("root directory overflows")?;
	if header.root_dir.length == 0 || root_end > response.blob.len() {
		return Ok((header, None));
	}

	let bytes = response.blob.read_range(&header.root_dir)?;
	let root = decode_directory(bytes, header.internal_compression, decompressor)
		.with_context(|| format!("decoding root directory of '{}'", source.get_name()))?;
	let key = directory_key(source, &header.root_dir, header.etag.as_deref());
	Ok((header, Some((key, root))))
}

/// Reads and decodes the directory at `range`, checking that the archive still has `etag`.
pub async fn fetch_directory(
	source: &DataReader,
	range: &ByteRange,
	etag: Option<&str>,
	compression: PMTilesCompression,
	decompressor: &Decompressor,
) -> Result<Directory> {
	log::trace!("fetching directory {range:?} of '{}'", source.get_name());

	let response = source
		.read_range(range, etag)
		.await
		.with_context(|| format!("reading directory {range:?} of '{}'", source.get_name()))?;
	decode_directory(response.blob, compression, decompressor)
		.with_context(|| format!("decoding directory {range:?} of '{}'", source.get_name()))
}

fn decode_directory(
	bytes: Blob,
	compression: PMTilesCompression,
	decompressor: &Decompressor,
) -> Result<Directory> {
	let blob = decompressor(bytes, compression)?;
	Directory::from_blob(&blob)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		PMTilesError,
		compression::default_decompressor,
		test_utils::{ArchiveBuilder, MockReader},
	};
	use pmtiles_core::io::DataReaderBlob;
	use std::sync::Arc;

	#[test]
	fn keys() {
		let source: DataReader = Arc::new(DataReaderBlob::new("berlin.pmtiles", Blob::new_empty()));
		assert_eq!(header_key(&source), "berlin.pmtiles");
		assert_eq!(
			directory_key(&source, &ByteRange::new(127, 300), Some("\"v1\"")),
			"berlin.pmtiles|\"v1\"|127|300"
		);
		assert_eq!(directory_key(&source, &ByteRange::new(127, 300), None), "berlin.pmtiles||127|300");
	}

	#[tokio::test]
	async fn header_with_root_in_prefix() -> Result<()> {
		let archive = ArchiveBuilder::new().add_tile(0, 0, 0, b"tile").build();
		let mock = Arc::new(MockReader::new(archive));
		let source: DataReader = mock.clone();

		let (header, root) = fetch_header_and_root(&source, &default_decompressor()).await?;
		let (key, root) = root.expect("root directory is inside the prefix");
		assert_eq!(key, format!("mock||{}|{}", header.root_dir.offset, header.root_dir.length));
		assert_eq!(root.len(), 1);
		assert_eq!(mock.calls(), 1);
		Ok(())
	}

	#[tokio::test]
	async fn header_with_root_outside_prefix() -> Result<()> {
		let archive = ArchiveBuilder::new()
			.add_tile(0, 0, 0, b"tile")
			.root_after_padding(20000)
			.build();
		let source: DataReader = Arc::new(MockReader::new(archive));

		let (header, root) = fetch_header_and_root(&source, &default_decompressor()).await?;
		assert!(root.is_none());
		assert!(header.root_dir.offset >= HEADER_PREFIX_LENGTH);

		let directory = fetch_directory(
			&source,
			&header.root_dir,
			header.etag.as_deref(),
			header.internal_compression,
			&default_decompressor(),
		)
		.await?;
		assert_eq!(directory.len(), 1);
		Ok(())
	}

	#[tokio::test]
	async fn not_an_archive() {
		let source: DataReader = Arc::new(DataReaderBlob::from(vec![0u8; 200]));
		let err = fetch_header_and_root(&source, &default_decompressor()).await.unwrap_err();
		assert_eq!(PMTilesError::find(&err), Some(&PMTilesError::WrongMagicNumber));
		assert_eq!(err.to_string(), "decoding header of 'memory'");
	}
}
