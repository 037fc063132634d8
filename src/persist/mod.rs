//! Persist Module
//!
//! Durable, versioned snapshots of the whole index.
//!
//! ## Responsibilities
//! - Stage every snapshot in `<file>.tmp`, then rename over `<file>`
//! - Flush the blob log before a snapshot claims its end offset
//! - Recover the index on startup, dispatching on the version tag
//!
//! ## File Format (version 0, text, whitespace separated)
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │ 0                                     version i16  │
//! ├────────────────────────────────────────────────────┤
//! │ <key> <offset> <size> <flags> <ttl>   one per key  │
//! │ ...                                                │
//! ├────────────────────────────────────────────────────┤
//! │ fileendpointer <offset>               sentinel     │
//! └────────────────────────────────────────────────────┘
//! ```

pub mod format;
mod persistor;

pub use format::{read_snapshot, Snapshot};
pub use persistor::{PersistJob, PersistStats, Persistor, RecoveryStats};

// =============================================================================
// Shared Constants
// =============================================================================

/// Current snapshot format version
pub const SNAPSHOT_VERSION: i16 = 0;

/// First token of the trailing end-offset line
pub const END_OFFSET_SENTINEL: &str = "fileendpointer";

/// Suffix of the staging file
pub const TEMP_SUFFIX: &str = ".tmp";
