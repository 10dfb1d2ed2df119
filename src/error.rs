//! Error types for MeridianDB's durability core
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using MeridianError
pub type Result<T> = std::result::Result<T, MeridianError>;

/// Unified error type for the durability and caching core
#[derive(Debug, Error)]
pub enum MeridianError {
    // -------------------------------------------------------------------------
    // Log File Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("log file already exists: {}", path.display())]
    FileExists { path: PathBuf },

    #[error("log file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("log file is not readable/writable: {}", path.display())]
    FileAccess { path: PathBuf },

    // -------------------------------------------------------------------------
    // Recovery Errors
    // -------------------------------------------------------------------------
    /// The stored header checksum does not match a full reconstruction
    /// from the valid records on disk. There is no safe prefix to keep.
    #[error(
        "corrupt log file {}: stored checksum {stored:#010x}, computed {computed:#010x}",
        path.display()
    )]
    CorruptLog {
        path: PathBuf,
        stored: u32,
        computed: u32,
    },

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("codec error: {0}")]
    Codec(String),
}
