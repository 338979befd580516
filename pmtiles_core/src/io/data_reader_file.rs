//! This module provides functionality for reading data from local files.
//!
//! # Examples
//!
//! ```rust
//! use pmtiles_core::{io::{DataReaderFile, DataReaderTrait}, ByteRange};
//! use anyhow::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let path = std::env::current_dir()?.join("Cargo.toml");
//!     let reader = DataReaderFile::open(&path)?;
//!
//!     let response = reader.read_range(&ByteRange::new(0, 9), None).await?;
//!     assert_eq!(response.blob.as_slice(), b"[package]");
//!
//!     Ok(())
//! }
//! ```

use super::{DataReaderTrait, RangeResponse};
use crate::{Blob, ByteRange};
use anyhow::{Context, Result, ensure};
use async_trait::async_trait;
use std::{
	fs::File,
	io::{Read, Seek, SeekFrom},
	path::Path,
};

/// A struct that provides reading capabilities from a file.
///
/// Files carry no identity token, so reads never fail with an ETag mismatch.
#[derive(Debug)]
pub struct DataReaderFile {
	name: String,
	file: File,
	size: u64,
}

impl DataReaderFile {
	/// Opens a file and creates a `DataReaderFile` instance.
	///
	/// # Errors
	/// Fails if the path does not exist, is not absolute or is not a regular file.
	pub fn open(path: &Path) -> Result<DataReaderFile> {
		ensure!(path.exists(), "file {path:?} does not exist");
		ensure!(path.is_absolute(), "path {path:?} must be absolute");
		ensure!(path.is_file(), "path {path:?} must be a file");

		let path = path.canonicalize()?;
		let file = File::open(&path).with_context(|| format!("failed to open file {path:?}"))?;
		let size = file.metadata()?.len();

		Ok(DataReaderFile {
			name: path.to_string_lossy().into_owned(),
			file,
			size,
		})
	}

	pub fn size(&self) -> u64 {
		self.size
	}
}

#[async_trait]
impl DataReaderTrait for DataReaderFile {
	async fn read_range(&self, range: &ByteRange, _expected_etag: Option<&str>) -> Result<RangeResponse> {
		let offset = range.offset.min(self.size);
		let length = range.length.min(self.size - offset);

		let mut buffer = vec![0; length as usize];
		let mut file = self
			.file
			.try_clone()
			.with_context(|| format!("failed to clone file '{}'", self.name))?;
		file
			.seek(SeekFrom::Start(offset))
			.with_context(|| format!("failed to seek to offset {offset} in file '{}'", self.name))?;
		file
			.read_exact(&mut buffer)
			.with_context(|| format!("failed to read {length} bytes at offset {offset} in file '{}'", self.name))?;

		Ok(RangeResponse::new(Blob::from(buffer)))
	}

	fn get_name(&self) -> &str {
		&self.name
	}
}
