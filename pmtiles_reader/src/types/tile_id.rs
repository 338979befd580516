//! Conversion between tile coordinates and the linear tile ids used by PMTiles directories.
//!
//! Ids are numbered zoom level by zoom level. Inside a level, tiles follow a Hilbert curve, so
//! tiles that are close on the map tend to get close ids. The id of the first tile of level `z`
//! is the number of tiles in all coarser levels.

use crate::PMTilesError;
use anyhow::{Result, bail};
use std::fmt;

/// The highest zoom level whose ids still fit into 53 bits.
pub const MAX_ZOOM: u8 = 26;

/// Id of the first tile of each zoom level: `sum(4^i)` for `i` in `0..z`.
const ZOOM_OFFSETS: [u64; MAX_ZOOM as usize + 1] = [
	0,
	1,
	5,
	21,
	85,
	341,
	1365,
	5461,
	21845,
	87381,
	349525,
	1398101,
	5592405,
	22369621,
	89478485,
	357913941,
	1431655765,
	5726623061,
	22906492245,
	91625968981,
	366503875925,
	1466015503701,
	5864062014805,
	23456248059221,
	93824992236885,
	375299968947541,
	1501199875790165,
];

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TileCoord {
	pub z: u8,
	pub x: u32,
	pub y: u32,
}

impl TileCoord {
	/// Creates a coordinate, checking zoom level and bounds.
	pub fn new(z: u8, x: u32, y: u32) -> Result<TileCoord> {
		if z > MAX_ZOOM {
			bail!(PMTilesError::ZoomOutOfRange(z));
		}
		let n = 1u64 << z;
		if u64::from(x) >= n || u64::from(y) >= n {
			bail!(PMTilesError::TileOutOfBounds { z, x, y });
		}
		Ok(TileCoord { z, x, y })
	}

	pub fn get_tile_id(&self) -> Result<u64> {
		zxy_to_tile_id(self.z, self.x, self.y)
	}

	pub fn from_tile_id(id: u64) -> Result<TileCoord> {
		tile_id_to_zxy(id)
	}
}

impl fmt::Display for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}/{}", self.z, self.x, self.y)
	}
}

/// Maps a tile coordinate to its tile id.
///
/// # Errors
/// Fails with [`PMTilesError::ZoomOutOfRange`] for zoom levels above 26 and with
/// [`PMTilesError::TileOutOfBounds`] if `x` or `y` lie outside `[0, 2^z)`.
pub fn zxy_to_tile_id(z: u8, x: u32, y: u32) -> Result<u64> {
	if z > MAX_ZOOM {
		bail!(PMTilesError::ZoomOutOfRange(z));
	}

	let n = 1i64 << z;
	if i64::from(x) >= n || i64::from(y) >= n {
		bail!(PMTilesError::TileOutOfBounds { z, x, y });
	}

	let mut tx = i64::from(x);
	let mut ty = i64::from(y);
	let mut d: i64 = 0;
	let mut s = n / 2;
	while s > 0 {
		let rx: u8 = u8::from((tx & s) > 0);
		let ry: u8 = u8::from((ty & s) > 0);
		d += s * s * i64::from((3 * rx) ^ ry);
		rotate(s, &mut tx, &mut ty, rx, ry);
		s /= 2;
	}

	Ok(ZOOM_OFFSETS[z as usize] + d as u64)
}

/// Maps a tile id back to its coordinate.
///
/// # Errors
/// Fails if the id lies beyond the last tile of zoom level 26.
pub fn tile_id_to_zxy(id: u64) -> Result<TileCoord> {
	for z in 0..=MAX_ZOOM {
		let num_tiles = 1u64 << (2 * u32::from(z));
		let first = ZOOM_OFFSETS[z as usize];
		if id >= first + num_tiles {
			continue;
		}

		let n = 1i64 << z;
		let mut t = id - first;
		let mut tx: i64 = 0;
		let mut ty: i64 = 0;
		let mut s: i64 = 1;
		while s < n {
			let rx = ((t / 2) & 1) as u8;
			let ry = ((t ^ u64::from(rx)) & 1) as u8;
			rotate(s, &mut tx, &mut ty, rx, ry);
			if rx == 1 {
				tx += s;
			}
			if ry == 1 {
				ty += s;
			}
			t /= 4;
			s *= 2;
		}

		return Ok(TileCoord {
			z,
			x: tx as u32,
			y: ty as u32,
		});
	}
	bail!(PMTilesError::ZoomOutOfRange(MAX_ZOOM + 1))
}

fn rotate(s: i64, tx: &mut i64, ty: &mut i64, rx: u8, ry: u8) {
	if ry == 0 {
		if rx == 1 {
			*tx = s - 1 - *tx;
			*ty = s - 1 - *ty;
		}
		std::mem::swap(tx, ty);
	}
}
