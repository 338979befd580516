//! Reader configuration, loaded from YAML.
//!
//! ```yaml
//! cache:
//!   kind: shared      # or "resolved"
//!   max_entries: 100
//! http:
//!   headers:
//!     Authorization: Bearer 1234
//!   max_retries: 3
//! ```
//!
//! Every field is optional.

use crate::cache::{DEFAULT_CACHE_CAPACITY, DirectoryCache, ResolvedValueCache, SharedFutureCache};
use anyhow::{Context, Result};
use pmtiles_core::io::{DataReader, DataReaderFile, DataReaderHttp};
use reqwest::Url;
use serde::Deserialize;
use std::{
	collections::HashMap,
	fs::File,
	io::{BufReader, Read},
	path::Path,
	sync::Arc,
};

#[derive(Default, Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReaderConfig {
	/// Directory cache settings
	#[serde(default)]
	pub cache: CacheConfig,

	/// Settings for archives read over HTTP(S)
	#[serde(default)]
	pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
	#[serde(default)]
	pub kind: CacheKind,

	/// Maximum number of cached headers and directories.
	#[serde(default = "default_max_entries")]
	pub max_entries: usize,
}

impl Default for CacheConfig {
	fn default() -> Self {
		Self {
			kind: CacheKind::default(),
			max_entries: default_max_entries(),
		}
	}
}

fn default_max_entries() -> usize {
	DEFAULT_CACHE_CAPACITY
}

#[derive(Default, Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
	/// Deduplicates concurrent reads of the same header or directory.
	#[default]
	Shared,
	/// Stores finished values only.
	Resolved,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
	/// Extra request headers, e.g. for authorization.
	#[serde(default)]
	pub headers: HashMap<String, String>,

	/// How often a request is retried after connection errors or timeouts.
	#[serde(default = "default_max_retries")]
	pub max_retries: u32,
}

impl Default for HttpConfig {
	fn default() -> Self {
		Self {
			headers: HashMap::new(),
			max_retries: default_max_retries(),
		}
	}
}

fn default_max_retries() -> u32 {
	3
}

impl ReaderConfig {
	pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
		Ok(serde_yaml_ng::from_reader(reader)?)
	}

	pub fn from_string(text: &str) -> Result<Self> {
		Ok(serde_yaml_ng::from_str(text)?)
	}

	pub fn from_path(path: &Path) -> Result<Self> {
		let file = File::open(path).with_context(|| format!("opening config file {path:?}"))?;
		ReaderConfig::from_reader(BufReader::new(file)).with_context(|| format!("parsing config file {path:?}"))
	}

	/// Creates the configured directory cache.
	pub fn build_cache(&self) -> Arc<dyn DirectoryCache> {
		match self.cache.kind {
			CacheKind::Shared => Arc::new(SharedFutureCache::new(self.cache.max_entries)),
			CacheKind::Resolved => Arc::new(ResolvedValueCache::new(self.cache.max_entries)),
		}
	}

	/// Opens a byte source for `location`: an `http(s)://` URL or a file path.
	/// Relative paths are resolved against the current directory.
	pub fn open_source(&self, location: &str) -> Result<DataReader> {
		if location.starts_with("http://") || location.starts_with("https://") {
			let url = Url::parse(location).with_context(|| format!("parsing URL '{location}'"))?;
			let reader = DataReaderHttp::from_url(url)?
				.with_headers(&self.http.headers)?
				.with_max_retries(self.http.max_retries);
			Ok(Arc::new(reader))
		} else {
			let path = std::path::absolute(location).with_context(|| format!("resolving path '{location}'"))?;
			Ok(Arc::new(DataReaderFile::open(&path)?))
		}
	}
}
