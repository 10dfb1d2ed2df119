//! Configuration for the durability core
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

/// How the write-ahead log forces buffered writes to stable storage.
///
/// The policy is a value-level description; [`crate::wal::Wal`] builds the
/// matching [`crate::wal::FlushStrategy`] from it at construction time.
#[derive(Debug, Clone, Copy)]
pub enum FlushPolicy {
    /// Force after every append (safest, slowest)
    Sync,

    /// Batch forces behind a byte threshold and a periodic timer.
    ///
    /// A force happens when either `byte_threshold` bytes have been
    /// written since the last force, or `interval` has elapsed, so at
    /// most one threshold's worth of appends can be lost on a crash.
    Batched {
        /// Timer period; also the elapsed-time flush threshold
        interval: Duration,

        /// Pending-byte count that triggers an early force
        byte_threshold: u64,
    },
}

impl FlushPolicy {
    /// Default timer period for [`FlushPolicy::Batched`]
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

    /// Default byte threshold for [`FlushPolicy::Batched`]: 256 KiB
    pub const DEFAULT_BYTE_THRESHOLD: u64 = 256 * 1024;

    /// Batched policy with the default interval and byte threshold
    pub fn batched() -> Self {
        FlushPolicy::Batched {
            interval: Self::DEFAULT_INTERVAL,
            byte_threshold: Self::DEFAULT_BYTE_THRESHOLD,
        }
    }

    /// Batched policy with an explicit interval, default byte threshold
    pub fn batched_every(interval: Duration) -> Self {
        FlushPolicy::Batched {
            interval,
            byte_threshold: Self::DEFAULT_BYTE_THRESHOLD,
        }
    }
}

impl Default for FlushPolicy {
    fn default() -> Self {
        FlushPolicy::batched()
    }
}
