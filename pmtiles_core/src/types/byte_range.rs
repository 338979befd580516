//! This module provides the `ByteRange` struct, which represents a range of bytes with an offset and length.
//!
//! Archive sections, directory entries and tile payloads are all addressed as byte ranges.
//!
//! # Examples
//!
//! ```rust
//! use pmtiles_core::ByteRange;
//!
//! let range = ByteRange::new(23, 42);
//! assert_eq!(range.end(), 65);
//! assert_eq!(range.get_shifted_forward(100).unwrap().offset, 123);
//! assert!(ByteRange::new(u64::MAX, 1).checked_end().is_none());
//! assert_eq!(format!("{range}"), "bytes=23-64");
//! ```

use anyhow::{Context, Result};
use std::{fmt, ops::Range};

/// A struct representing a range of bytes with an offset and length.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct ByteRange {
	/// The starting offset of the byte range.
	pub offset: u64,
	/// The length of the byte range.
	pub length: u64,
}

impl ByteRange {
	/// Creates a new `ByteRange` with the specified offset and length.
	pub fn new(offset: u64, length: u64) -> Self {
		Self { offset, length }
	}

	/// Creates an empty `ByteRange` with zero offset and length.
	pub fn empty() -> Self {
		Self { offset: 0, length: 0 }
	}

	/// The first offset after the range, or `None` if it does not fit into a `u64`.
	pub fn checked_end(&self) -> Option<u64> {
		self.offset.checked_add(self.length)
	}

	/// The first offset after the range, saturating at `u64::MAX`.
	pub fn end(&self) -> u64 {
		self.offset.saturating_add(self.length)
	}

	/// Returns a new `ByteRange` that is shifted forward by the specified offset.
	///
	/// Directory entries store offsets relative to their section; shifting by the section
	/// offset yields the absolute position inside the archive.
	///
	/// # Errors
	/// Fails if the shifted range would end beyond `u64::MAX`.
	pub fn get_shifted_forward(&self, offset: u64) -> Result<Self> {
		let shifted = Self {
			offset: self
				.offset
				.checked_add(offset)
				.with_context(|| format!("shifting {self:?} by {offset} overflows"))?,
			length: self.length,
		};
		shifted
			.checked_end()
			.with_context(|| format!("shifting {self:?} by {offset} overflows"))?;
		Ok(shifted)
	}

	/// Returns `true` if `other` lies completely inside this range.
	pub fn contains(&self, other: &ByteRange) -> bool {
		other.offset >= self.offset && other.end() <= self.end()
	}

	/// Converts the `ByteRange` to a `Range<usize>`.
	pub fn as_range_usize(&self) -> Range<usize> {
		Range {
			start: self.offset as usize,
			end: self.end() as usize,
		}
	}
}

impl fmt::Debug for ByteRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ByteRange[{},{}]", self.offset, self.length)
	}
}

/// Formats the range as the value of an HTTP `Range` header.
impl fmt::Display for ByteRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "bytes={}-{}", self.offset, self.end().saturating_sub(1))
	}
}
