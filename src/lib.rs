//! # MeridianDB durability core
//!
//! The durability-and-caching core of the MeridianDB relational engine:
//! - Write-Ahead Logging (WAL) with checksum-chained integrity
//! - Crash recovery by truncating partially-written tails
//! - Pluggable flush scheduling (sync vs. time/byte-batched)
//! - Bounded in-memory caches (recency- and frequency-evicting)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Data / Index Managers                    │
//! │            (append before mutate, replay on boot)            │
//! └──────────┬─────────────────────────────┬────────────────────┘
//!            │                             │
//! ┌──────────▼──────────┐       ┌──────────▼──────────┐
//! │         WAL         │       │       Caches        │
//! │  (append / replay)  │       │  LruCache NodeCache │
//! └──────────┬──────────┘       └─────────────────────┘
//!            │
//! ┌──────────▼──────────┐
//! │   Flush Strategy    │
//! │  (Sync / Batched)   │
//! └─────────────────────┘
//! ```
//!
//! A data manager appends a record *before* applying the mutation it
//! describes, then replays via `rewind` + `next` on recovery. The WAL
//! hands every write length to the flush strategy, which decides when
//! the file is forced to stable storage. The caches are independent,
//! pulled on demand to keep hot decoded nodes off disk.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod wal;
pub mod cache;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{MeridianError, Result};
pub use config::FlushPolicy;
pub use wal::Wal;
pub use cache::{LruCache, NodeCache};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
