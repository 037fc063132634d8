//! # blobindex
//!
//! The persistent index of a blob-storage partition:
//! - Concurrent in-memory map from blob key to log location
//! - Strictly increasing log end offset, checked on every add
//! - Versioned text snapshots with atomic tmp-and-rename swaps
//! - Bounded journal for "what changed since offset X" queries
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Storage engine write/read path               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ add / exists / get / find_missing
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                          Index                               │
//! │              (write_lock + end offset invariant)             │
//! └──────┬──────────────────────┬───────────────────────┬───────┘
//!        │                      │                       │
//!        ▼                      ▼                       ▼
//!  ┌───────────┐         ┌─────────────┐         ┌─────────────┐
//!  │  Journal  │         │ IndexTable  │◄────────│  Persistor  │◄── Scheduler
//!  │ (window)  │         │  (RwLock)   │  copy   │ (tmp+rename)│    (periodic)
//!  └───────────┘         └─────────────┘         └──────┬──────┘
//!                                                       │ flush()
//!                                                       ▼
//!                                                ┌─────────────┐
//!                                                │     Log     │
//!                                                └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod key;
pub mod entry;
pub mod journal;
pub mod table;
pub mod persist;
pub mod log;
pub mod scheduler;
pub mod index;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::IndexConfig;
pub use entry::{IndexEntry, IndexValue};
pub use error::{IndexError, Result};
pub use index::Index;
pub use journal::JournalRead;
pub use key::{BlobId, BlobIdFactory, IndexKey, KeyFactory};
pub use log::Log;
pub use scheduler::{Job, PeriodicScheduler, Scheduler};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of blobindex
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
