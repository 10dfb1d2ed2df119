//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through append-only logging.
//!
//! ## Responsibilities
//! - Append log records before any mutation is applied
//! - Seeded checksums per record for corruption detection
//! - A running header checksum chained over every committed record
//! - Crash recovery by truncating incomplete trailing records
//! - Pluggable flush scheduling (sync vs. batched)
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Header                                  │
//! │ ┌─────────────────────────────────────┐ │
//! │ │ File checksum (4, big-endian)       │ │
//! │ └─────────────────────────────────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Record 1                                │
//! │ ┌─────────┬──────────────┬────────────┐ │
//! │ │ Len (4) │ Checksum (4) │  Payload   │ │
//! │ └─────────┴──────────────┴────────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Record 2                                │
//! │ ┌─────────┬──────────────┬────────────┐ │
//! │ │ Len (4) │ Checksum (4) │  Payload   │ │
//! │ └─────────┴──────────────┴────────────┘ │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Per-record checksums cover the payload only; the file checksum in the
//! header folds the full bytes of every record, so a single comparison
//! validates the whole file at open time.

mod flush;
mod log;
mod record;

pub use flush::{BatchedFlush, FlushStrategy, SyncFlush};
pub use log::Wal;
pub use record::{checksum, FILE_HEADER_SIZE, RECORD_HEADER_SIZE, SEED};
