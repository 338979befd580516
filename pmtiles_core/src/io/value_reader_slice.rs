//! This module provides the `ValueReaderSlice` struct for reading values from a byte slice.
//!
//! # Examples
//!
//! ```rust
//! use pmtiles_core::io::{ValueReader, ValueReaderSlice};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let data = &[0x01, 0x02, 0xAC, 0x02];
//!
//!     let mut reader = ValueReaderSlice::new_le(data);
//!     assert_eq!(reader.read_u16()?, 0x0201);
//!     assert_eq!(reader.read_varint()?, 300);
//!
//!     Ok(())
//! }
//! ```

use super::{SeekRead, ValueReader};
use anyhow::{Result, bail};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::{io::Cursor, marker::PhantomData};

/// A struct that provides reading capabilities from a byte slice using a specified byte order.
pub struct ValueReaderSlice<'a, E: ByteOrder> {
	_phantom: PhantomData<E>,
	cursor: Cursor<&'a [u8]>,
	len: u64,
}

impl<'a, E: ByteOrder> ValueReaderSlice<'a, E> {
	#[must_use]
	pub fn new(slice: &'a [u8]) -> ValueReaderSlice<'a, E> {
		ValueReaderSlice {
			_phantom: PhantomData,
			len: slice.len() as u64,
			cursor: Cursor::new(slice),
		}
	}
}

impl<'a> ValueReaderSlice<'a, LittleEndian> {
	/// Creates a new `ValueReaderSlice` with little-endian byte order.
	#[must_use]
	pub fn new_le(slice: &'a [u8]) -> ValueReaderSlice<'a, LittleEndian> {
		ValueReaderSlice::new(slice)
	}
}

impl<'a> ValueReaderSlice<'a, BigEndian> {
	/// Creates a new `ValueReaderSlice` with big-endian byte order.
	#[must_use]
	pub fn new_be(slice: &'a [u8]) -> ValueReaderSlice<'a, BigEndian> {
		ValueReaderSlice::new(slice)
	}
}

impl SeekRead for Cursor<&[u8]> {}

impl<'a, E: ByteOrder + 'a> ValueReader<'a, E> for ValueReaderSlice<'a, E> {
	fn get_reader(&mut self) -> &mut dyn SeekRead {
		&mut self.cursor
	}

	fn len(&self) -> u64 {
		self.len
	}

	fn position(&mut self) -> u64 {
		self.cursor.position()
	}

	fn set_position(&mut self, position: u64) -> Result<()> {
		if position > self.len {
			bail!("set position {position} outside length {}", self.len)
		}
		self.cursor.set_position(position);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(&[0x00], 0)]
	#[case(&[0x01], 1)]
	#[case(&[0x7F], 127)]
	#[case(&[0x80, 0x01], 128)]
	#[case(&[0xAC, 0x02], 300)]
	#[case(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F], 0xFFFF_FFFF)]
	#[case(&[0x80, 0x80, 0x80, 0x80, 0x10], 1 << 32)]
	#[case(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01], u64::MAX)]
	fn read_varint(#[case] bytes: &[u8], #[case] expected: u64) -> Result<()> {
		let mut reader = ValueReaderSlice::new_le(bytes);
		assert_eq!(reader.read_varint()?, expected);
		assert!(!reader.has_remaining());
		Ok(())
	}

	#[test]
	fn read_varint_sequence() -> Result<()> {
		let mut reader = ValueReaderSlice::new_le(&[0x03, 0xAC, 0x02, 0x00]);
		assert_eq!(reader.read_varint()?, 3);
		assert_eq!(reader.read_varint()?, 300);
		assert_eq!(reader.read_varint()?, 0);
		Ok(())
	}

	#[test]
	fn read_varint_too_long() {
		let mut reader = ValueReaderSlice::new_le(&[0x80; 11]);
		assert_eq!(
			reader.read_varint().unwrap_err().to_string(),
			"varint too long: expected not more than 10 bytes"
		);
	}

	#[test]
	fn read_varint_overflow() {
		let mut reader = ValueReaderSlice::new_le(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x02]);
		assert_eq!(reader.read_varint().unwrap_err().to_string(), "varint exceeds 64 bits");
	}

	#[test]
	fn read_varint_truncated() {
		let mut reader = ValueReaderSlice::new_le(&[0x80, 0x80]);
		assert!(reader.read_varint().is_err());
	}

	#[test]
	fn read_fixed_width_le() -> Result<()> {
		let bytes = [0x50, 0x4D, 0xFD, 0xFF, 0xFF, 0xFF, 1, 0, 0, 0, 2, 0, 0, 0];
		let mut reader = ValueReaderSlice::new_le(&bytes);
		assert_eq!(reader.read_u16()?, 0x4D50);
		assert_eq!(reader.read_i32()?, -3);
		assert_eq!(reader.read_u64()?, (2u64 << 32) + 1);
		Ok(())
	}

	#[test]
	fn read_fixed_width_be() -> Result<()> {
		let mut reader = ValueReaderSlice::new_be(&[0x01, 0x02, 0x00, 0x00, 0x00, 0x2A]);
		assert_eq!(reader.read_u16()?, 0x0102);
		assert_eq!(reader.read_u32()?, 42);
		Ok(())
	}

	#[test]
	fn set_and_get_position() -> Result<()> {
		let mut reader = ValueReaderSlice::new_le(&[0x01, 0x02, 0x03, 0x04]);
		reader.set_position(2)?;
		assert_eq!(reader.position(), 2);
		assert_eq!(reader.remaining(), 2);
		assert_eq!(reader.read_u8()?, 0x03);
		assert!(reader.set_position(5).is_err());
		Ok(())
	}
}
