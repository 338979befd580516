use anyhow::{Result, bail};

/// Compression tag stored in the header, once for directories and metadata, once for tiles.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PMTilesCompression {
	Unknown = 0x0,
	None = 0x1,
	Gzip = 0x2,
	Brotli = 0x3,
	Zstd = 0x4,
}

impl PMTilesCompression {
	pub fn from_u8(value: u8) -> Result<Self> {
		match value {
			0 => Ok(PMTilesCompression::Unknown),
			1 => Ok(PMTilesCompression::None),
			2 => Ok(PMTilesCompression::Gzip),
			3 => Ok(PMTilesCompression::Brotli),
			4 => Ok(PMTilesCompression::Zstd),
			_ => bail!("Unknown value {value} for PMTiles compression"),
		}
	}
}
