//! Error types for blobindex
//!
//! One error type for every index operation. Recovery failures are kept
//! distinct from fatal I/O so `Index::open` can decide between resetting to
//! an empty index and refusing to start.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using IndexError
pub type Result<T> = std::result::Result<T, IndexError>;

/// Unified error type for blobindex operations
#[derive(Debug, Error)]
pub enum IndexError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Mutation Errors
    // -------------------------------------------------------------------------
    #[error("end offset {proposed} does not advance current end offset {current}")]
    InvariantViolation { current: u64, proposed: u64 },

    #[error("key {0:?} cannot be stored: it must be one non-empty field without whitespace")]
    UnwritableKey(String),

    #[error("index is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Recovery Errors
    // -------------------------------------------------------------------------
    #[error("snapshot not found: {}", .0.display())]
    SnapshotNotFound(PathBuf),

    #[error("snapshot is empty")]
    EmptySnapshot,

    #[error("unsupported snapshot version: {0}")]
    UnsupportedVersion(i16),

    #[error("malformed snapshot at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("key parse error: {0}")]
    KeyParse(String),

    // -------------------------------------------------------------------------
    // Collaborator Errors
    // -------------------------------------------------------------------------
    #[error("scheduler error: {0}")]
    Scheduler(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl IndexError {
    /// True for failures that mean "no usable prior state".
    ///
    /// `Index::open` resets to an empty index on these and propagates
    /// everything else.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            IndexError::SnapshotNotFound(_)
                | IndexError::EmptySnapshot
                | IndexError::UnsupportedVersion(_)
                | IndexError::Malformed { .. }
                | IndexError::KeyParse(_)
        )
    }
}
