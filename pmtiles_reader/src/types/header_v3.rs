use super::{PMTilesCompression, PMTilesType};
use crate::PMTilesError;
use anyhow::{Result, bail, ensure};
use pmtiles_core::{
	Blob, ByteRange,
	io::{ValueReader, ValueReaderSlice},
};

/// "PM" read as a little-endian u16.
pub const MAGIC_NUMBER: u16 = 0x4D50;

/// The highest spec version this reader understands.
pub const MAX_SPEC_VERSION: u8 = 3;

#[derive(Clone, Debug, PartialEq)]
pub struct HeaderV3 {
	pub spec_version: u8,
	pub root_dir: ByteRange,
	pub metadata: ByteRange,
	pub leaf_dirs: ByteRange,
	pub tile_data: ByteRange,
	pub addressed_tiles_count: u64,
	pub tile_entries_count: u64,
	pub tile_contents_count: u64,
	pub clustered: bool,
	pub internal_compression: PMTilesCompression,
	pub tile_compression: PMTilesCompression,
	pub tile_type: PMTilesType,
	pub min_zoom: u8,
	pub max_zoom: u8,
	pub min_lon_e7: i32,
	pub min_lat_e7: i32,
	pub max_lon_e7: i32,
	pub max_lat_e7: i32,
	pub center_zoom: u8,
	pub center_lon_e7: i32,
	pub center_lat_e7: i32,
	/// Identity of the archive the header was read from, as reported by the byte source.
	pub etag: Option<String>,
}

impl HeaderV3 {
	/// Size of the serialized header in bytes.
	pub const LENGTH: u64 = 127;

	/// Decodes the header from the first bytes of an archive.
	///
	/// Bytes beyond the first 127 are ignored, so the bootstrap prefix can be passed directly.
	///
	/// # Errors
	/// Fails with [`PMTilesError::WrongMagicNumber`] or [`PMTilesError::UnsupportedVersion`] for
	/// data that is not a readable archive, and if a compression or tile type tag is unknown.
	pub fn deserialize(blob: &Blob, etag: Option<String>) -> Result<Self> {
		ensure!(
			blob.len() >= Self::LENGTH,
			"archive is too short for a PMTiles header: {} bytes",
			blob.len()
		);

		let mut reader = ValueReaderSlice::new_le(blob.as_slice());
		if reader.read_u16()? != MAGIC_NUMBER {
			bail!(PMTilesError::WrongMagicNumber);
		}

		reader.set_position(7)?;
		let spec_version = reader.read_u8()?;
		if spec_version > MAX_SPEC_VERSION {
			bail!(PMTilesError::UnsupportedVersion(spec_version));
		}

		let header = Self {
			spec_version,
			root_dir: ByteRange::new(reader.read_u64()?, reader.read_u64()?),
			metadata: ByteRange::new(reader.read_u64()?, reader.read_u64()?),
			leaf_dirs: ByteRange::new(reader.read_u64()?, reader.read_u64()?),
			tile_data: ByteRange::new(reader.read_u64()?, reader.read_u64()?),
			addressed_tiles_count: reader.read_u64()?,
			tile_entries_count: reader.read_u64()?,
			tile_contents_count: reader.read_u64()?,
			clustered: reader.read_u8()? == 1,
			internal_compression: PMTilesCompression::from_u8(reader.read_u8()?)?,
			tile_compression: PMTilesCompression::from_u8(reader.read_u8()?)?,
			tile_type: PMTilesType::from_u8(reader.read_u8()?)?,
			min_zoom: reader.read_u8()?,
			max_zoom: reader.read_u8()?,
			min_lon_e7: reader.read_i32()?,
			min_lat_e7: reader.read_i32()?,
			max_lon_e7: reader.read_i32()?,
			max_lat_e7: reader.read_i32()?,
			center_zoom: reader.read_u8()?,
			center_lon_e7: reader.read_i32()?,
			center_lat_e7: reader.read_i32()?,
			etag,
		};

		for (name, range) in [
			("root directory", &header.root_dir),
			("metadata", &header.metadata),
			("leaf directories", &header.leaf_dirs),
			("tile data", &header.tile_data),
		] {
			ensure!(range.checked_end().is_some(), "{name} section {range:?} overflows");
		}

		Ok(header)
	}

	pub fn min_lon(&self) -> f64 {
		f64::from(self.min_lon_e7) / 1e7
	}

	pub fn min_lat(&self) -> f64 {
		f64::from(self.min_lat_e7) / 1e7
	}

	pub fn max_lon(&self) -> f64 {
		f64::from(self.max_lon_e7) / 1e7
	}

	pub fn max_lat(&self) -> f64 {
		f64::from(self.max_lat_e7) / 1e7
	}

	pub fn center_lon(&self) -> f64 {
		f64::from(self.center_lon_e7) / 1e7
	}

	pub fn center_lat(&self) -> f64 {
		f64::from(self.center_lat_e7) / 1e7
	}

	/// `[min_lon, min_lat, max_lon, max_lat]` in degrees.
	pub fn bounds(&self) -> [f64; 4] {
		[self.min_lon(), self.min_lat(), self.max_lon(), self.max_lat()]
	}

	/// Returns `false` if the bounds are empty or inverted. Such archives can still serve tiles.
	pub fn has_valid_bounds(&self) -> bool {
		self.min_lon_e7 < self.max_lon_e7 && self.min_lat_e7 < self.max_lat_e7
	}

	pub fn contains_zoom(&self, z: u8) -> bool {
		(self.min_zoom..=self.max_zoom).contains(&z)
	}
}
