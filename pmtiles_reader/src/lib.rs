//! Read tiles and metadata from PMTiles v3 archives, locally or over HTTP.
//!
//! An archive starts with a fixed-size header, followed by a root directory that maps tile ids to
//! byte ranges, either of tiles or of leaf directories. [`PMTilesReader`] resolves `z/x/y`
//! requests through these directories and keeps decoded headers and directories in a
//! [`DirectoryCache`](cache::DirectoryCache).
//!
//! ```rust,no_run
//! use pmtiles_reader::{PMTilesReader, ReaderConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ReaderConfig::from_string("cache:\n  max_entries: 500\n")?;
//!     let reader = PMTilesReader::from_config("https://example.org/planet.pmtiles", &config)?;
//!     let tilejson = reader.get_tilejson("https://tiles.example.org/planet").await?;
//!     println!("{tilejson}");
//!     Ok(())
//! }
//! ```

pub mod cache;

mod compression;
pub use compression::{Decompressor, decompress, default_decompressor};

mod config;
pub use config::{CacheConfig, CacheKind, HttpConfig, ReaderConfig};

mod error;
pub use error::{PMTilesError, is_etag_mismatch};

mod reader;
pub use reader::{PMTilesReader, TileResponse};

mod types;
pub use types::*;

#[cfg(test)]
mod test_utils;
