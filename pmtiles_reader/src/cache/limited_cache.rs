//! A bounded key-value store with usage-order eviction.
//!
//! Every access stamps the entry with the next value of a counter. When an insert pushes the
//! store over its capacity, the single entry with the oldest stamp is evicted. Finding it is a
//! linear scan, which is fine for the small capacities directory caches use.
//!
//! # Examples
//!
//! ```rust
//! use pmtiles_reader::cache::LimitedCache;
//!
//! let mut cache = LimitedCache::<u64>::new(2);
//! cache.insert("a".to_string(), 1);
//! cache.insert("b".to_string(), 2);
//! cache.get("a");
//! cache.insert("c".to_string(), 3);
//! assert_eq!(cache.get("b"), None);
//! assert_eq!(cache.get("a"), Some(1));
//! ```

use std::{collections::HashMap, fmt::Debug};

struct CacheEntry<V> {
	data: V,
	last_used: u64,
}

pub struct LimitedCache<V> {
	entries: HashMap<String, CacheEntry<V>>,
	counter: u64,
	capacity: usize,
}

impl<V: Clone> LimitedCache<V> {
	/// Creates a cache holding at most `capacity` entries. A capacity of 0 is raised to 1.
	pub fn new(capacity: usize) -> Self {
		Self {
			entries: HashMap::new(),
			counter: 0,
			capacity: capacity.max(1),
		}
	}

	fn next_stamp(&mut self) -> u64 {
		self.counter += 1;
		self.counter
	}

	/// Returns a clone of the value and marks the entry as used.
	pub fn get(&mut self, key: &str) -> Option<V> {
		let stamp = self.next_stamp();
		let entry = self.entries.get_mut(key)?;
		entry.last_used = stamp;
		Some(entry.data.clone())
	}

	/// Returns the value without marking the entry as used.
	pub fn peek(&self, key: &str) -> Option<&V> {
		self.entries.get(key).map(|entry| &entry.data)
	}

	/// Inserts or replaces a value and evicts the least recently used entry if the cache is over
	/// capacity.
	pub fn insert(&mut self, key: String, data: V) {
		let last_used = self.next_stamp();
		self.entries.insert(key, CacheEntry { data, last_used });
		if self.entries.len() > self.capacity {
			self.evict_one();
		}
	}

	pub fn remove(&mut self, key: &str) -> Option<V> {
		self.entries.remove(key).map(|entry| entry.data)
	}

	fn evict_one(&mut self) {
		let oldest = self
			.entries
			.iter()
			.min_by_key(|(_, entry)| entry.last_used)
			.map(|(key, _)| key.clone());
		if let Some(key) = oldest {
			log::trace!("evicting cache entry '{key}'");
			self.entries.remove(&key);
		}
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.entries.contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}
}

impl<V> Debug for LimitedCache<V> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LimitedCache")
			.field("length", &self.entries.len())
			.field("capacity", &self.capacity)
			.finish()
	}
}
