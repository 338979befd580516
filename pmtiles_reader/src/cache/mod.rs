//! Caches for decoded headers and directories.
//!
//! Two implementations of [`DirectoryCache`] exist:
//! - [`SharedFutureCache`] stores in-flight reads, so concurrent requests for the same header or
//!   directory cause a single read. This is the default.
//! - [`ResolvedValueCache`] stores finished values only and is the simpler choice for callers
//!   that do not issue concurrent requests.

mod fetch;
mod limited_cache;
mod resolved_value;
mod shared_future;
mod traits;

use crate::{Directory, HeaderV3};
use std::sync::Arc;

pub use fetch::HEADER_PREFIX_LENGTH;
pub use limited_cache::LimitedCache;
pub use resolved_value::ResolvedValueCache;
pub use shared_future::{SharedError, SharedFutureCache};
pub use traits::DirectoryCache;

/// Default number of headers and directories a cache keeps.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

#[derive(Clone, Debug)]
enum CacheValue {
	Header(Arc<HeaderV3>),
	Directory(Arc<Directory>),
}
