//! Byte-level building blocks for reading tile archives: blobs, byte ranges, value readers,
//! range-addressable data sources and decompression helpers.

pub mod macros;

pub mod compression;

pub mod io;

mod types;
pub use types::*;
