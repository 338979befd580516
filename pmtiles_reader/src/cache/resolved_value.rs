//! A cache of decoded values.
//!
//! Only finished results are stored. Two callers missing the same key at the same time both
//! read and decode it; the later result replaces the earlier one. Use
//! [`SharedFutureCache`](super::SharedFutureCache) to deduplicate concurrent reads.

use super::{
	CacheValue, DirectoryCache, LimitedCache,
	fetch::{directory_key, fetch_directory, fetch_header_and_root, header_key},
};
use crate::{Decompressor, Directory, HeaderV3};
use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::Mutex;
use pmtiles_core::{ByteRange, io::DataReader};
use std::sync::Arc;

#[derive(Debug)]
pub struct ResolvedValueCache {
	cache: Mutex<LimitedCache<CacheValue>>,
}

impl ResolvedValueCache {
	pub fn new(capacity: usize) -> Self {
		Self {
			cache: Mutex::new(LimitedCache::new(capacity)),
		}
	}
}

#[async_trait]
impl DirectoryCache for ResolvedValueCache {
	async fn get_header(&self, source: &DataReader, decompressor: &Decompressor) -> Result<Arc<HeaderV3>> {
		let key = header_key(source);
		let cached = self.cache.lock().get(&key);
		match cached {
			Some(CacheValue::Header(header)) => return Ok(header),
			Some(CacheValue::Directory(_)) => bail!("cache entry '{key}' holds a directory instead of a header"),
			None => log::trace!("header cache miss for '{key}'"),
		}

		let (header, root) = fetch_header_and_root(source, decompressor).await?;
		let header = Arc::new(header);

		let mut cache = self.cache.lock();
		if let Some((root_key, root)) = root {
			cache.insert(root_key, CacheValue::Directory(Arc::new(root)));
		}
		cache.insert(key, CacheValue::Header(header.clone()));
		Ok(header)
	}

	async fn get_directory(
		&self,
		source: &DataReader,
		range: &ByteRange,
		header: &HeaderV3,
		decompressor: &Decompressor,
	) -> Result<Arc<Directory>> {
		let key = directory_key(source, range, header.etag.as_deref());
		let cached = self.cache.lock().get(&key);
		match cached {
			Some(CacheValue::Directory(directory)) => return Ok(directory),
			Some(CacheValue::Header(_)) => bail!("cache entry '{key}' holds a header instead of a directory"),
			None => log::trace!("directory cache miss for '{key}'"),
		}

		let directory = Arc::new(
			fetch_directory(
				source,
				range,
				header.etag.as_deref(),
				header.internal_compression,
				decompressor,
			)
			.await?,
		);
		self.cache.lock().insert(key, CacheValue::Directory(directory.clone()));
		Ok(directory)
	}

	async fn invalidate(&self, source: &DataReader, _decompressor: &Decompressor) -> Result<()> {
		let key = header_key(source);
		log::debug!("invalidating cached header of '{key}'");
		self.cache.lock().remove(&key);
		Ok(())
	}

	fn len(&self) -> usize {
		self.cache.lock().len()
	}

	fn capacity(&self) -> usize {
		self.cache.lock().capacity()
	}
}
