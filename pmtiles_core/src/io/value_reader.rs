// This module defines the `ValueReader` trait for reading little- or big-endian values and
// LEB128 varints from an in-memory source.
//
// Archive headers are fixed-layout little-endian records, directories are streams of
// varints; both are decoded through this trait.

use anyhow::{Result, bail};
use byteorder::{ByteOrder, ReadBytesExt};
use std::io::{Read, Seek};

/// A simple alias for types implementing both `Seek` and `Read`, used for convenience.
pub trait SeekRead: Seek + Read {}

/// A trait for reading values from various sources with support for different byte orders.
pub trait ValueReader<'a, E: ByteOrder + 'a> {
	/// Returns the underlying reader to access raw bytes.
	fn get_reader(&mut self) -> &mut dyn SeekRead;

	/// Returns the total length of the readable data.
	fn len(&self) -> u64;

	/// Returns the current position within the readable data.
	fn position(&mut self) -> u64;

	/// Sets the current position within the readable data.
	///
	/// # Errors
	/// Returns an error if the position lies outside the data.
	fn set_position(&mut self, position: u64) -> Result<()>;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns the number of bytes remaining to be read.
	fn remaining(&mut self) -> u64 {
		self.len() - self.position()
	}

	fn has_remaining(&mut self) -> bool {
		self.remaining() > 0
	}

	/// Reads an unsigned LEB128 varint: 7 payload bits per byte, least significant group first,
	/// high bit set on every byte except the last.
	///
	/// # Errors
	/// Returns an error if the data ends inside the varint, or if it is longer than 10 bytes or
	/// does not fit into 64 bits.
	fn read_varint(&mut self) -> Result<u64> {
		let mut value = 0;
		let mut shift = 0;
		loop {
			let byte = self.get_reader().read_u8()?;
			if shift == 63 && byte & 0x7E != 0 {
				bail!("varint exceeds 64 bits");
			}
			value |= (u64::from(byte) & 0x7F) << shift;
			if byte & 0x80 == 0 {
				break;
			}
			shift += 7;
			if shift >= 64 {
				bail!("varint too long: expected not more than 10 bytes");
			}
		}
		Ok(value)
	}

	fn read_u8(&mut self) -> Result<u8> {
		Ok(self.get_reader().read_u8()?)
	}

	fn read_u16(&mut self) -> Result<u16> {
		Ok(self.get_reader().read_u16::<E>()?)
	}

	fn read_i32(&mut self) -> Result<i32> {
		Ok(self.get_reader().read_i32::<E>()?)
	}

	fn read_u32(&mut self) -> Result<u32> {
		Ok(self.get_reader().read_u32::<E>()?)
	}

	/// Reads an unsigned 64-bit integer.
	///
	/// Stored as two 32-bit halves (low, high), which in little-endian order is the same
	/// byte sequence as a native `u64`.
	fn read_u64(&mut self) -> Result<u64> {
		Ok(self.get_reader().read_u64::<E>()?)
	}
}
