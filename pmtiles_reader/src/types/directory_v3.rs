//! Decoding of and lookups in PMTiles directories.
//!
//! A serialized directory is a varint entry count `n` followed by four arrays of `n` varints:
//! tile id deltas, run lengths, lengths and offsets. An offset of `0` after the first entry
//! means "directly after the previous entry"; any other value `v` is the offset `v - 1`.

use super::EntryV3;
use crate::PMTilesError;
use anyhow::{Context, Result, bail, ensure};
use pmtiles_core::{
	Blob, ByteRange,
	io::{ValueReader, ValueReaderSlice},
};
use std::{cmp::Ordering, slice::Iter};

/// A decoded directory: entries sorted ascending by tile id.
#[derive(Debug, PartialEq)]
pub struct Directory {
	entries: Vec<EntryV3>,
}

impl Directory {
	/// Decodes an uncompressed directory.
	///
	/// # Errors
	/// Fails with [`PMTilesError::EmptyDirectory`] if the directory has no entries, and with a
	/// descriptive error if the data is truncated or inconsistent.
	pub fn from_blob(blob: &Blob) -> Result<Directory> {
		let mut reader = ValueReaderSlice::new_le(blob.as_slice());

		let num_entries = reader.read_varint().context("reading directory entry count")?;
		if num_entries == 0 {
			bail!(PMTilesError::EmptyDirectory);
		}
		// every entry needs at least one byte in each of the four arrays
		ensure!(
			num_entries.saturating_mul(4) <= reader.remaining(),
			"directory claims {num_entries} entries, but has only {} bytes left",
			reader.remaining()
		);
		let num_entries = num_entries as usize;

		let mut entries: Vec<EntryV3> = Vec::with_capacity(num_entries);
		let mut last_id: u64 = 0;
		for _ in 0..num_entries {
			last_id = last_id
				.checked_add(reader.read_varint()?)
				.context("tile id overflow in directory")?;
			entries.push(EntryV3::new(last_id, ByteRange::empty(), 0));
		}

		for entry in &mut entries {
			entry.run_length = u32::try_from(reader.read_varint()?).context("run length exceeds 32 bits")?;
		}

		for entry in &mut entries {
			entry.range.length = u64::from(u32::try_from(reader.read_varint()?).context("length exceeds 32 bits")?);
		}

		for i in 0..num_entries {
			let value = reader.read_varint()?;
			entries[i].range.offset = if i > 0 && value == 0 {
				entries[i - 1]
					.range
					.checked_end()
					.context("directory entry offset overflows")?
			} else {
				value.checked_sub(1).context("first directory entry has no explicit offset")?
			};
			entries[i]
				.range
				.checked_end()
				.with_context(|| format!("directory entry {:?} overflows", entries[i].range))?;
		}

		Ok(Directory { entries })
	}

	/// Finds the entry covering `tile_id`.
	///
	/// Locates the last entry with an id not greater than `tile_id` and accepts it if it is a
	/// leaf pointer or if its run covers `tile_id`.
	pub fn find_tile(&self, tile_id: u64) -> Option<EntryV3> {
		let mut m: i64 = 0;
		let mut n: i64 = self.entries.len() as i64 - 1;

		while m <= n {
			let k = (n + m) >> 1;
			let entry_id = self.entries[k as usize].tile_id;
			match tile_id.cmp(&entry_id) {
				Ordering::Greater => m = k + 1,
				Ordering::Less => n = k - 1,
				Ordering::Equal => return Some(self.entries[k as usize]),
			}
		}

		// at this point, m > n
		if n >= 0 {
			let entry = self.entries[n as usize];
			if entry.run_length == 0 || tile_id - entry.tile_id < u64::from(entry.run_length) {
				return Some(entry);
			}
		}

		None
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> Iter<'_, EntryV3> {
		self.entries.iter()
	}
}
