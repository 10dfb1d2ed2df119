//! Bounded In-Memory Caches
//!
//! Two fixed-capacity caches with different eviction policies:
//!
//! - [`LruCache`]: generic key→value cache evicting the least-recently
//!   used entry. Reusable by any component needing a bounded keyed
//!   cache (decoded statements, table metadata, ...).
//! - [`NodeCache`]: frequency-based cache for decoded index/data nodes
//!   keyed by 64-bit ids (see [`crate::codec::key_uid`]), evicting the
//!   least-frequently used entry, oldest first within a frequency.
//!
//! Both are thread-safe behind a single exclusive lock per cache.
//! Absent keys are a normal result, never an error.

mod lfu;
mod lru;

pub use lfu::NodeCache;
pub use lru::LruCache;
