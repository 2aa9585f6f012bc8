//! Persistent wheel cache
//!
//! Content-addressed caching of prebuilt wheel artifacts, keyed by a
//! digest of the dependency manifest contents. Same manifests = same
//! cache. Entries are immutable once published.
//!
//! # Cache States
//!
//! | State | Description |
//! |-------|-------------|
//! | Miss | No entry for the key, wheel build runs |
//! | Hit | Entry exists, wheel build is skipped entirely |
//! | Prefix match | Near-matching entry, advisory only |

pub mod key;
pub mod store;

pub use key::{CacheKey, DEFAULT_NAMESPACE};
pub use store::{CacheEntry, FsWheelStore, WheelStore};
