use crate::{Decompressor, Directory, HeaderV3};
use anyhow::Result;
use async_trait::async_trait;
use pmtiles_core::{ByteRange, io::DataReader};
use std::{fmt::Debug, sync::Arc};

/// Memoizes decoded headers and directories of one or more archives.
///
/// Headers are keyed by the name of the source. Directories are keyed by source name, archive
/// ETag, offset and length, so entries of an outdated archive are never returned for a newer one.
/// `decompressor` is applied to directory bytes with the internal compression of the header.
#[async_trait]
pub trait DirectoryCache: Debug + Send + Sync {
	/// Returns the header of the archive, reading it on a miss.
	async fn get_header(&self, source: &DataReader, decompressor: &Decompressor) -> Result<Arc<HeaderV3>>;

	/// Returns the directory stored at `range`, reading it on a miss.
	async fn get_directory(
		&self,
		source: &DataReader,
		range: &ByteRange,
		header: &HeaderV3,
		decompressor: &Decompressor,
	) -> Result<Arc<Directory>>;

	/// Forgets the header of the archive so the next access sees its current version.
	async fn invalidate(&self, source: &DataReader, decompressor: &Decompressor) -> Result<()>;

	/// Number of cached headers and directories, including ones still being read.
	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn capacity(&self) -> usize;
}
