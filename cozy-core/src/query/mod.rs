//! Client-side cache of server data, keyed by resource-id tuples.
//!
//! Views read through [`QueryCache::fetch`]; mutations never write to the
//! cache directly, they invalidate keys and let the next read refetch.

mod cache;
mod key;
mod loadable;

pub use cache::{CachePolicy, QueryCache};
pub use key::{KeyPattern, QueryKey};
pub use loadable::Loadable;
