//! Readers for binary values and for range-addressable data sources.
//!
//! # Overview
//!
//! - [`ValueReader`] / [`ValueReaderSlice`] decode fixed-width integers and varints from bytes
//!   already in memory.
//! - [`DataReaderTrait`] is the byte-range source an archive is read from. Implementations exist
//!   for in-memory blobs ([`DataReaderBlob`]), local files ([`DataReaderFile`]) and HTTP(S)
//!   endpoints ([`DataReaderHttp`]).

mod data_reader;
mod data_reader_blob;
mod data_reader_file;
mod data_reader_http;
mod value_reader;
mod value_reader_slice;

pub use data_reader::*;
pub use data_reader_blob::*;
pub use data_reader_file::*;
pub use data_reader_http::*;
pub use value_reader::*;
pub use value_reader_slice::*;
