//! A cache of in-flight reads.
//!
//! # Overview
//!
//! Instead of finished values, `SharedFutureCache` stores the future computing them, wrapped in
//! [`futures::future::Shared`]. The first caller that misses a key inserts the future; every
//! later caller for the same key awaits a clone of it. So at most one read per key is in flight,
//! and all waiters receive the same value or the same error.
//!
//! Dropping a waiter does not cancel the read for the others: the shared future keeps its state
//! and is driven by whichever waiter polls it next, including callers arriving later.
//!
//! A failed future is removed from the cache by the waiter that observes the failure, so the next
//! caller starts a fresh read.
//!
//! Concurrent [`invalidate`](DirectoryCache::invalidate) calls for one archive share a single
//! refresh of the header.

use super::{
	CacheValue, DirectoryCache, LimitedCache,
	fetch::{directory_key, fetch_directory, fetch_header_and_root, header_key},
};
use crate::{Decompressor, Directory, HeaderV3};
use anyhow::{Result, bail};
use async_trait::async_trait;
use futures::{
	FutureExt,
	future::{BoxFuture, Shared, ready},
};
use parking_lot::Mutex;
use pmtiles_core::{ByteRange, io::DataReader};
use std::{collections::HashMap, error::Error, fmt, sync::Arc};

/// An error shared by every waiter of a failed computation.
///
/// Displays like the wrapped error and exposes the rest of its chain as `source()`.
#[derive(Clone, Debug)]
pub struct SharedError(pub Arc<anyhow::Error>);

impl SharedError {
	pub fn inner(&self) -> &anyhow::Error {
		&self.0
	}
}

impl From<anyhow::Error> for SharedError {
	fn from(err: anyhow::Error) -> Self {
		SharedError(Arc::new(err))
	}
}

impl fmt::Display for SharedError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&*self.0, f)
	}
}

impl Error for SharedError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		self.0.chain().nth(1)
	}
}

type SharedFuture = Shared<BoxFuture<'static, Result<CacheValue, SharedError>>>;
type SharedRefresh = Shared<BoxFuture<'static, Result<(), SharedError>>>;

pub struct SharedFutureCache {
	cache: Arc<Mutex<LimitedCache<SharedFuture>>>,
	invalidations: Arc<Mutex<HashMap<String, SharedRefresh>>>,
}

impl SharedFutureCache {
	pub fn new(capacity: usize) -> Self {
		Self {
			cache: Arc::new(Mutex::new(LimitedCache::new(capacity))),
			invalidations: Arc::new(Mutex::new(HashMap::new())),
		}
	}

	/// Returns the future cached under `key`, or inserts the one built by `make`.
	fn get_or_insert(&self, key: &str, make: impl FnOnce() -> SharedFuture) -> SharedFuture {
		let mut cache = self.cache.lock();
		if let Some(future) = cache.get(key) {
			log::trace!("cache hit for '{key}'");
			return future;
		}
		log::trace!("cache miss for '{key}'");
		let future = make();
		cache.insert(key.to_string(), future.clone());
		future
	}

	/// Awaits a cached future. On failure the entry is dropped, unless it was replaced meanwhile.
	async fn resolve(&self, key: &str, future: SharedFuture) -> Result<CacheValue> {
		match future.clone().await {
			Ok(value) => Ok(value),
			Err(err) => {
				let mut cache = self.cache.lock();
				if cache.peek(key).is_some_and(|cached| cached.ptr_eq(&future)) {
					cache.remove(key);
				}
				Err(err.into())
			}
		}
	}
}

/// Builds the future reading the header. When it completes, a root directory that came with the
/// header is put into `cache` as an already resolved entry.
fn header_future(
	source: DataReader,
	decompressor: Decompressor,
	cache: Arc<Mutex<LimitedCache<SharedFuture>>>,
) -> SharedFuture {
	async move {
		let (header, root) = fetch_header_and_root(&source, &decompressor).await?;
		if let Some((root_key, root)) = root {
			let resolved: SharedFuture = ready(Ok(CacheValue::Directory(Arc::new(root)))).boxed().shared();
			cache.lock().insert(root_key, resolved);
		}
		Ok::<_, anyhow::Error>(CacheValue::Header(Arc::new(header)))
	}
	.map(|result| result.map_err(SharedError::from))
	.boxed()
	.shared()
}

#[async_trait]
impl DirectoryCache for SharedFutureCache {
	async fn get_header(&self, source: &DataReader, decompressor: &Decompressor) -> Result<Arc<HeaderV3>> {
		let key = header_key(source);
		let future = self.get_or_insert(&key, || {
			header_future(source.clone(), decompressor.clone(), self.cache.clone())
		});
		match self.resolve(&key, future).await? {
			CacheValue::Header(header) => Ok(header),
			CacheValue::Directory(_) => bail!("cache entry '{key}' holds a directory instead of a header"),
		}
	}

	async fn get_directory(
		&self,
		source: &DataReader,
		range: &ByteRange,
		header: &HeaderV3,
		decompressor: &Decompressor,
	) -> Result<Arc<Directory>> {
		let key = directory_key(source, range, header.etag.as_deref());
		let future = self.get_or_insert(&key, || {
			let source = source.clone();
			let decompressor = decompressor.clone();
			let range = *range;
			let etag = header.etag.clone();
			let compression = header.internal_compression;
			async move {
				let directory = fetch_directory(&source, &range, etag.as_deref(), compression, &decompressor).await?;
				Ok::<_, anyhow::Error>(CacheValue::Directory(Arc::new(directory)))
			}
			.map(|result| result.map_err(SharedError::from))
			.boxed()
			.shared()
		});
		match self.resolve(&key, future).await? {
			CacheValue::Directory(directory) => Ok(directory),
			CacheValue::Header(_) => bail!("cache entry '{key}' holds a header instead of a directory"),
		}
	}

	/// Drops the cached header and reads it again.
	///
	/// A call arriving while a refresh of the same archive is running awaits that refresh.
	async fn invalidate(&self, source: &DataReader, decompressor: &Decompressor) -> Result<()> {
		let key = header_key(source);
		let refresh = {
			let mut invalidations = self.invalidations.lock();
			if let Some(refresh) = invalidations.get(&key) {
				log::trace!("joining running invalidation of '{key}'");
				refresh.clone()
			} else {
				log::debug!("invalidating cached header of '{key}'");
				let refresh = refresh_future(
					key.clone(),
					source.clone(),
					decompressor.clone(),
					self.cache.clone(),
					self.invalidations.clone(),
				);
				invalidations.insert(key, refresh.clone());
				refresh
			}
		};
		Ok(refresh.await?)
	}

	fn len(&self) -> usize {
		self.cache.lock().len()
	}

	fn capacity(&self) -> usize {
		self.cache.lock().capacity()
	}
}

fn refresh_future(
	key: String,
	source: DataReader,
	decompressor: Decompressor,
	cache: Arc<Mutex<LimitedCache<SharedFuture>>>,
	invalidations: Arc<Mutex<HashMap<String, SharedRefresh>>>,
) -> SharedRefresh {
	async move {
		let future = header_future(source, decompressor, cache.clone());
		cache.lock().insert(key.clone(), future.clone());

		let result = future.clone().await.map(|_| ());
		if result.is_err() {
			let mut cache = cache.lock();
			if cache.peek(&key).is_some_and(|cached| cached.ptr_eq(&future)) {
				cache.remove(&key);
			}
		}
		invalidations.lock().remove(&key);
		result
	}
	.boxed()
	.shared()
}

impl fmt::Debug for SharedFutureCache {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SharedFutureCache")
			.field("cache", &*self.cache.lock())
			.field("invalidations", &self.invalidations.lock().len())
			.finish()
	}
}
