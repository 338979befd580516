mod blob;
mod byte_range;

pub use blob::Blob;
pub use byte_range::ByteRange;
