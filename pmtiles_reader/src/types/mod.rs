mod directory_v3;
mod entry_v3;
mod header_v3;
mod tile_compression;
mod tile_id;
mod tile_type;

pub use directory_v3::Directory;
pub use entry_v3::EntryV3;
pub use header_v3::{HeaderV3, MAGIC_NUMBER, MAX_SPEC_VERSION};
pub use tile_compression::PMTilesCompression;
pub use tile_id::{MAX_ZOOM, TileCoord, tile_id_to_zxy, zxy_to_tile_id};
pub use tile_type::PMTilesType;
