use anyhow::{Result, bail};

/// Format of the tiles stored in an archive.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PMTilesType {
	UNKNOWN = 0x0,
	MVT = 0x1,
	PNG = 0x2,
	JPEG = 0x3,
	WEBP = 0x4,
	AVIF = 0x5,
}

impl PMTilesType {
	pub fn from_u8(value: u8) -> Result<Self> {
		match value {
			0 => Ok(PMTilesType::UNKNOWN),
			1 => Ok(PMTilesType::MVT),
			2 => Ok(PMTilesType::PNG),
			3 => Ok(PMTilesType::JPEG),
			4 => Ok(PMTilesType::WEBP),
			5 => Ok(PMTilesType::AVIF),
			_ => bail!("Unknown value {value} for PMTiles type"),
		}
	}

	/// File extension used in tile URLs, including the leading dot.
	pub fn extension(&self) -> &'static str {
		match self {
			PMTilesType::UNKNOWN => "",
			PMTilesType::MVT => ".mvt",
			PMTilesType::PNG => ".png",
			PMTilesType::JPEG => ".jpg",
			PMTilesType::WEBP => ".webp",
			PMTilesType::AVIF => ".avif",
		}
	}

	pub fn content_type(&self) -> &'static str {
		match self {
			PMTilesType::UNKNOWN => "application/octet-stream",
			PMTilesType::MVT => "application/x-protobuf",
			PMTilesType::PNG => "image/png",
			PMTilesType::JPEG => "image/jpeg",
			PMTilesType::WEBP => "image/webp",
			PMTilesType::AVIF => "image/avif",
		}
	}
}
