//! This module provides the [`Blob`] struct, a wrapper around [`Vec<u8>`] used for every chunk of
//! bytes moving through the reader: archive prefixes, directories, metadata and tiles.
//!
//! # Examples
//!
//! ```rust
//! use pmtiles_core::{Blob, ByteRange};
//!
//! let blob = Blob::from(vec![0, 1, 2, 3, 4, 5, 6, 7]);
//! assert_eq!(blob.len(), 8);
//! assert_eq!(blob.range(2..5), &[2, 3, 4]);
//! assert_eq!(blob.read_range(&ByteRange::new(6, 2)).unwrap().as_slice(), &[6, 7]);
//! ```

use super::ByteRange;
use anyhow::{Result, ensure};
use std::{fmt::Debug, ops::Range};

/// A simple wrapper around [`Vec<u8>`] that provides additional methods for working with byte data.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Blob(Vec<u8>);

impl Blob {
	/// Creates an empty `Blob`.
	#[must_use]
	pub fn new_empty() -> Blob {
		Blob(Vec::new())
	}

	/// Returns a byte slice from the specified `range`.
	///
	/// # Panics
	///
	/// Panics if the specified range is out of bounds.
	#[must_use]
	pub fn range(&self, range: Range<usize>) -> &[u8] {
		&self.0[range]
	}

	/// Returns a new [`Blob`] containing the bytes in the specified [`ByteRange`].
	///
	/// # Errors
	///
	/// Returns an error if the specified range is out of bounds.
	pub fn read_range(&self, range: &ByteRange) -> Result<Blob> {
		ensure!(
			range.end() <= self.0.len() as u64,
			"read outside range: {range:?} exceeds blob length {}",
			self.0.len()
		);
		Ok(Blob::from(&self.0[range.as_range_usize()]))
	}

	/// Returns a new [`Blob`] with at most `length` bytes starting at `offset`.
	///
	/// Ranges reaching past the end are truncated; an offset past the end yields an empty blob.
	#[must_use]
	pub fn read_range_truncated(&self, range: &ByteRange) -> Blob {
		let size = self.0.len() as u64;
		let start = range.offset.min(size);
		let end = range.end().min(size);
		Blob::from(&self.0[start as usize..end as usize])
	}

	#[must_use]
	pub fn as_slice(&self) -> &[u8] {
		&self.0
	}

	#[must_use]
	pub fn into_vec(self) -> Vec<u8> {
		self.0
	}

	/// Interprets the bytes as UTF-8, replacing invalid sequences.
	#[must_use]
	pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
		String::from_utf8_lossy(&self.0)
	}

	/// Renders the bytes as space separated lowercase hex pairs, e.g. `"03 01 ff"`.
	#[must_use]
	pub fn as_hex(&self) -> String {
		self.0.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
	}

	#[must_use]
	pub fn len(&self) -> u64 {
		self.0.len() as u64
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<Vec<u8>> for Blob {
	fn from(item: Vec<u8>) -> Self {
		Blob(item)
	}
}

impl From<&Vec<u8>> for Blob {
	fn from(item: &Vec<u8>) -> Self {
		Blob(item.clone())
	}
}

impl From<&[u8]> for Blob {
	fn from(item: &[u8]) -> Self {
		Blob(item.to_vec())
	}
}

impl<const N: usize> From<&[u8; N]> for Blob {
	fn from(item: &[u8; N]) -> Self {
		Blob(item.to_vec())
	}
}

impl From<&str> for Blob {
	fn from(item: &str) -> Self {
		Blob(item.as_bytes().to_vec())
	}
}

impl From<String> for Blob {
	fn from(item: String) -> Self {
		Blob(item.into_bytes())
	}
}

impl Debug for Blob {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Blob({})", self.0.len())
	}
}
