use pmtiles_core::ByteRange;

/// One directory entry.
///
/// With `run_length > 0` the entry addresses `run_length` consecutive tile ids that share the
/// same tile bytes; `range` is relative to the tile data section. With `run_length == 0` it
/// points to a leaf directory; `range` is then relative to the leaf directory section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryV3 {
	pub tile_id: u64,
	pub range: ByteRange,
	pub run_length: u32,
}

impl EntryV3 {
	pub fn new(tile_id: u64, range: ByteRange, run_length: u32) -> Self {
		Self {
			tile_id,
			range,
			run_length,
		}
	}

	pub fn is_leaf_pointer(&self) -> bool {
		self.run_length == 0
	}
}
