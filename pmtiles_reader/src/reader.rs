//! Provides functionality for reading tiles and metadata from a PMTiles archive.
//!
//! # Overview
//!
//! `PMTilesReader` resolves a tile coordinate to its bytes:
//!
//! 1. The coordinate is converted to a tile id.
//! 2. The header is taken from the cache. Zoom levels outside the archive's range are answered
//!    with `None` without further reads.
//! 3. Starting at the root directory, directories are looked up through the cache. An entry with a
//!    run length is a tile, an entry without one points to a leaf directory. At most four
//!    directory levels are followed.
//! 4. The tile bytes are read, checking that the archive still has the ETag of the header, and
//!    decompressed.
//!
//! If the archive changes while it is read, the reader invalidates the cached header and retries
//! once. A second change during the retry is reported as an error.
//!
//! # Example
//!
//! ```rust,no_run
//! use pmtiles_reader::PMTilesReader;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let reader = PMTilesReader::open_path(Path::new("/data/berlin.pmtiles"))?;
//!
//!     println!("metadata: {}", reader.get_metadata().await?);
//!     if let Some(tile) = reader.get_tile(14, 8800, 5373).await? {
//!         println!("tile has {} bytes", tile.blob.len());
//!     }
//!     Ok(())
//! }
//! ```

use crate::{
	Decompressor, HeaderV3, PMTilesError, ReaderConfig,
	cache::{DEFAULT_CACHE_CAPACITY, DirectoryCache, SharedFutureCache},
	compression::default_decompressor,
	is_etag_mismatch, zxy_to_tile_id,
};
use anyhow::{Context, Result, bail};
use pmtiles_core::{
	Blob,
	io::{DataReader, DataReaderFile, DataReaderHttp},
};
use reqwest::Url;
use serde_json::{Map, Value, json};
use std::{fmt, future::Future, path::Path, sync::Arc};

/// Root directory plus at most three levels of leaf directories.
const MAX_DIRECTORY_DEPTH: usize = 4;

/// Decompressed tile bytes plus the caching headers the byte source reported for them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileResponse {
	pub blob: Blob,
	pub cache_control: Option<String>,
	pub expires: Option<String>,
}

/// A struct that provides functionality to read tiles and metadata from a PMTiles archive.
#[derive(Clone)]
pub struct PMTilesReader {
	source: DataReader,
	cache: Arc<dyn DirectoryCache>,
	decompressor: Decompressor,
}

impl PMTilesReader {
	/// Creates a reader with a [`SharedFutureCache`] and the built-in decompressors.
	pub fn new(source: DataReader) -> PMTilesReader {
		log::debug!("Opening PMTilesReader for {}", source.get_name());
		PMTilesReader {
			source,
			cache: Arc::new(SharedFutureCache::new(DEFAULT_CACHE_CAPACITY)),
			decompressor: default_decompressor(),
		}
	}

	/// Uses `cache` for headers and directories. A cache can be shared by several readers.
	pub fn with_cache(mut self, cache: Arc<dyn DirectoryCache>) -> Self {
		self.cache = cache;
		self
	}

	/// Replaces the function that decompresses directories, metadata and tiles.
	pub fn with_decompressor(mut self, decompressor: Decompressor) -> Self {
		self.decompressor = decompressor;
		self
	}

	/// Opens a local archive.
	///
	/// # Errors
	/// Fails if the path does not exist, is not absolute or is not a file.
	pub fn open_path(path: &Path) -> Result<PMTilesReader> {
		Ok(PMTilesReader::new(Arc::new(DataReaderFile::open(path)?)))
	}

	/// Opens an archive served over HTTP(S).
	pub fn open_url(url: Url) -> Result<PMTilesReader> {
		Ok(PMTilesReader::new(Arc::new(DataReaderHttp::from_url(url)?)))
	}

	/// Opens the archive at `location` (a URL or a file path) with the cache and HTTP settings of
	/// `config`.
	pub fn from_config(location: &str, config: &ReaderConfig) -> Result<PMTilesReader> {
		Ok(PMTilesReader::new(config.open_source(location)?).with_cache(config.build_cache()))
	}

	pub fn source_name(&self) -> &str {
		self.source.get_name()
	}

	pub fn cache(&self) -> &Arc<dyn DirectoryCache> {
		&self.cache
	}

	pub async fn get_header(&self) -> Result<Arc<HeaderV3>> {
		self.cache.get_header(&self.source, &self.decompressor).await
	}

	/// Returns the decompressed tile at `z`/`x`/`y`, or `None` if the archive does not contain it.
	///
	/// # Errors
	/// Fails before any read if the coordinate is invalid, and if the archive is malformed,
	/// unreadable, or changed twice while being read.
	pub async fn get_tile(&self, z: u8, x: u32, y: u32) -> Result<Option<TileResponse>> {
		log::trace!("get_tile {z}/{x}/{y}");

		let tile_id = zxy_to_tile_id(z, x, y)?;
		self
			.retry_on_etag_mismatch(|| self.get_tile_attempt(z, tile_id))
			.await
			.with_context(|| format!("reading tile {z}/{x}/{y} from '{}'", self.source_name()))
	}

	async fn get_tile_attempt(&self, z: u8, tile_id: u64) -> Result<Option<TileResponse>> {
		let header = self.get_header().await?;
		if !header.contains_zoom(z) {
			return Ok(None);
		}

		let mut range = header.root_dir;
		for depth in 0..MAX_DIRECTORY_DEPTH {
			let directory = self
				.cache
				.get_directory(&self.source, &range, &header, &self.decompressor)
				.await?;

			let Some(entry) = directory.find_tile(tile_id) else {
				return Ok(None);
			};
			if entry.range.length == 0 {
				return Ok(None);
			}

			if entry.is_leaf_pointer() {
				range = entry
					.range
					.get_shifted_forward(header.leaf_dirs.offset)
					.context("locating leaf directory")?;
				continue;
			}

			let tile_range = entry
				.range
				.get_shifted_forward(header.tile_data.offset)
				.context("locating tile data")?;
			log::trace!("reading tile {tile_id} at {tile_range:?}, directory depth {depth}");
			let response = self.source.read_range(&tile_range, header.etag.as_deref()).await?;
			let blob = (self.decompressor)(response.blob, header.tile_compression)?;
			return Ok(Some(TileResponse {
				blob,
				cache_control: response.cache_control,
				expires: response.expires,
			}));
		}

		bail!(PMTilesError::MaxDepthExceeded)
	}

	/// Returns the JSON metadata of the archive. An empty metadata section yields an empty object.
	pub async fn get_metadata(&self) -> Result<Value> {
		self
			.retry_on_etag_mismatch(|| self.get_metadata_attempt())
			.await
			.with_context(|| format!("reading metadata from '{}'", self.source_name()))
	}

	async fn get_metadata_attempt(&self) -> Result<Value> {
		let header = self.get_header().await?;
		if header.metadata.length == 0 {
			return Ok(Value::Object(Map::new()));
		}

		let response = self.source.read_range(&header.metadata, header.etag.as_deref()).await?;
		let blob = (self.decompressor)(response.blob, header.internal_compression)?;
		serde_json::from_slice(blob.as_slice()).context("parsing metadata JSON")
	}

	/// Builds a TileJSON 3.0.0 document for the archive, with tile URLs below `base_url`.
	pub async fn get_tilejson(&self, base_url: &str) -> Result<Value> {
		let metadata = self.get_metadata().await?;
		let header = self.get_header().await?;

		let mut tilejson = json!({
			"tilejson": "3.0.0",
			"scheme": "xyz",
			"tiles": [format!("{base_url}/{{z}}/{{x}}/{{y}}{}", header.tile_type.extension())],
		});
		for key in ["vector_layers", "attribution", "description", "name", "version"] {
			if let Some(value) = metadata.get(key) {
				tilejson[key] = value.clone();
			}
		}
		tilejson["bounds"] = json!(header.bounds());
		tilejson["center"] = json!([header.center_lon(), header.center_lat(), header.center_zoom]);
		tilejson["minzoom"] = json!(header.min_zoom);
		tilejson["maxzoom"] = json!(header.max_zoom);
		Ok(tilejson)
	}

	/// Checks the geographic bounds of the header and logs an error if they are empty or inverted.
	pub async fn check_bounds(&self) -> Result<bool> {
		let header = self.get_header().await?;
		let valid = header.has_valid_bounds();
		if !valid {
			let [min_lon, min_lat, max_lon, max_lat] = header.bounds();
			log::error!(
				"Bounds of PMTiles archive '{}' are not valid: {min_lon},{min_lat},{max_lon},{max_lat}",
				self.source_name()
			);
		}
		Ok(valid)
	}

	/// Runs `attempt`; if it fails because the archive changed, drops the cached header and runs it
	/// exactly once more.
	async fn retry_on_etag_mismatch<T, F, Fut>(&self, attempt: F) -> Result<T>
	where
		F: Fn() -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		match attempt().await {
			Err(err) if is_etag_mismatch(&err) => {
				log::warn!("archive '{}' has changed, retrying once: {err:#}", self.source_name());
				self.cache.invalidate(&self.source, &self.decompressor).await?;
				attempt().await
			}
			result => result,
		}
	}
}

impl fmt::Debug for PMTilesReader {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PMTilesReader")
			.field("source", &self.source)
			.field("cache", &self.cache)
			.finish()
	}
}
