//! Configuration for blobindex
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{IndexError, Result};

/// Configuration for one index (one storage partition)
#[derive(Debug, Clone)]
pub struct IndexConfig {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Partition directory holding the snapshot
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── index_current      (live snapshot)
    ///     └── index_current.tmp  (staging file, only during a write)
    pub data_dir: PathBuf,

    /// Snapshot file name inside `data_dir`
    pub snapshot_file_name: String,

    // -------------------------------------------------------------------------
    // Persistence Schedule
    // -------------------------------------------------------------------------
    /// Delay before the first background snapshot
    pub persist_initial_delay: Duration,

    /// Period between background snapshots
    pub persist_period: Duration,

    // -------------------------------------------------------------------------
    // Journal Configuration
    // -------------------------------------------------------------------------
    /// Number of recent entries retained for catch-up queries
    pub journal_capacity: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./blobindex_data"),
            snapshot_file_name: "index_current".to_string(),
            persist_initial_delay: Duration::from_millis(5000),
            persist_period: Duration::from_millis(60000),
            journal_capacity: 1024,
        }
    }
}

impl IndexConfig {
    /// Create a new config builder
    pub fn builder() -> IndexConfigBuilder {
        IndexConfigBuilder::default()
    }

    /// Path of the live snapshot file
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(&self.snapshot_file_name)
    }

    /// Reject settings the index cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.snapshot_file_name.is_empty() {
            return Err(IndexError::Config(
                "snapshot file name must not be empty".to_string(),
            ));
        }
        if self.snapshot_file_name.contains(std::path::is_separator) {
            return Err(IndexError::Config(format!(
                "snapshot file name must not contain a path separator: {}",
                self.snapshot_file_name
            )));
        }
        if self.persist_period.is_zero() {
            return Err(IndexError::Config(
                "persist period must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for IndexConfig
#[derive(Default)]
pub struct IndexConfigBuilder {
    config: IndexConfig,
}

impl IndexConfigBuilder {
    /// Set the partition data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the snapshot file name
    pub fn snapshot_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.snapshot_file_name = name.into();
        self
    }

    /// Set the delay before the first background snapshot
    pub fn persist_initial_delay(mut self, delay: Duration) -> Self {
        self.config.persist_initial_delay = delay;
        self
    }

    /// Set the period between background snapshots
    pub fn persist_period(mut self, period: Duration) -> Self {
        self.config.persist_period = period;
        self
    }

    /// Set the journal capacity (in entries)
    pub fn journal_capacity(mut self, capacity: usize) -> Self {
        self.config.journal_capacity = capacity;
        self
    }

    pub fn build(self) -> IndexConfig {
        self.config
    }
}
