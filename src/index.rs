//! Index Module
//!
//! The top-level blob index of one storage partition.
//!
//! ## Responsibilities
//! - Map blob keys to their location in the append-only log
//! - Enforce the strictly increasing log end offset
//! - Recover from the partition's snapshot on open
//! - Keep the snapshot fresh through a scheduled background job

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::IndexConfig;
use crate::entry::{IndexEntry, IndexValue};
use crate::error::{IndexError, Result};
use crate::journal::{Journal, JournalRead};
use crate::key::KeyFactory;
use crate::log::Log;
use crate::persist::{format, PersistJob, PersistStats, Persistor};
use crate::scheduler::Scheduler;
use crate::table::IndexTable;

/// Name the persistence job is registered under
pub const PERSIST_JOB_NAME: &str = "index persistor";

/// Crash-recoverable key → location index
///
/// ## Concurrency Model
///
/// - **Mutations** (`add`/`add_batch`/`close`): serialized by `write_lock`.
///   Entries are inserted first, then the end offset is published, so a
///   reader never sees an end offset ahead of its entries.
///
/// - **Queries** (`exists`/`get`/`find_missing`): take only the table's
///   read lock and never touch disk.
///
/// - **Snapshots**: the persistor copies the table under a brief read lock
///   and does all file I/O outside it.
pub struct Index<F: KeyFactory> {
    config: IndexConfig,
    table: Arc<IndexTable<F::Key>>,
    journal: Journal<F::Key>,
    persistor: Arc<Persistor<F>>,
    write_lock: Mutex<()>,
    closed: AtomicBool,
    final_written: AtomicBool,
}

impl<F: KeyFactory> Index<F> {
    /// Open the index for one partition
    ///
    /// On startup:
    /// 1. Create the data directory if needed
    /// 2. Remove a stale staging file and read the snapshot
    /// 3. Reset to an empty index if the snapshot is missing or unusable
    /// 4. Register the background persistence job
    ///
    /// Any I/O failure other than an unusable snapshot is returned.
    pub fn open<S>(
        config: IndexConfig,
        factory: F,
        log: Arc<dyn Log>,
        scheduler: &S,
    ) -> Result<Self>
    where
        S: Scheduler + ?Sized,
    {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let table = Arc::new(IndexTable::new());
        let persistor = Arc::new(Persistor::new(
            config.snapshot_path(),
            Arc::clone(&table),
            factory,
            log,
        )?);

        match persistor.read() {
            Ok(stats) => {
                tracing::info!(
                    path = %persistor.path().display(),
                    entries = stats.entries_recovered,
                    end_offset = stats.end_offset,
                    "Recovered index from snapshot"
                );
            }
            Err(e) if e.is_recoverable() => {
                tracing::warn!(
                    path = %persistor.path().display(),
                    error = %e,
                    "No usable index snapshot, starting from an empty index"
                );
                table.clear();
            }
            Err(e) => return Err(e),
        }

        let journal = Journal::new(config.journal_capacity, table.end_offset());

        scheduler.schedule(
            PERSIST_JOB_NAME,
            Arc::new(PersistJob::new(Arc::clone(&persistor))),
            config.persist_initial_delay,
            config.persist_period,
        )?;

        Ok(Self {
            config,
            table,
            journal,
            persistor,
            write_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
            final_written: AtomicBool::new(false),
        })
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Insert or overwrite one entry and advance the end offset
    ///
    /// Fails with `InvariantViolation` unless `new_end_offset` is strictly
    /// greater than the current end offset, and with `UnwritableKey` if the
    /// key could not be written to a snapshot. The index is unchanged then.
    pub fn add(&self, entry: IndexEntry<F::Key>, new_end_offset: u64) -> Result<()> {
        self.apply(vec![entry], new_end_offset)
    }

    /// Insert a batch of entries sharing one end offset advance
    pub fn add_batch(&self, entries: Vec<IndexEntry<F::Key>>, new_end_offset: u64) -> Result<()> {
        self.apply(entries, new_end_offset)
    }

    fn apply(&self, entries: Vec<IndexEntry<F::Key>>, new_end_offset: u64) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        if self.closed.load(Ordering::Acquire) {
            return Err(IndexError::Closed);
        }

        let current = self.table.end_offset();
        if new_end_offset <= current {
            return Err(IndexError::InvariantViolation {
                current,
                proposed: new_end_offset,
            });
        }
        for entry in &entries {
            format::check_key(&entry.key)?;
        }

        self.table.insert_all(&entries);
        for entry in entries {
            self.journal.record(entry, new_end_offset);
        }
        self.table.publish_end_offset(new_end_offset);

        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn exists(&self, key: &F::Key) -> bool {
        self.table.contains(key)
    }

    /// Keys from `keys` that are not in the index, in input order
    pub fn find_missing(&self, keys: &[F::Key]) -> Vec<F::Key> {
        self.table.missing(keys)
    }

    pub fn get(&self, key: &F::Key) -> Option<IndexValue> {
        self.table.get(key)
    }

    pub fn current_end_offset(&self) -> u64 {
        self.table.end_offset()
    }

    /// Entries applied since the index reached end offset `offset`
    ///
    /// `offset` is an end offset the caller has already seen, e.g. an earlier
    /// `current_end_offset()`. Flag updates that keep an entry's location are
    /// included. Returns `JournalRead::Gap` when the journal window no longer
    /// reaches back to `offset`; use `scan_since` then.
    pub fn entries_since(&self, offset: u64) -> JournalRead<F::Key> {
        self.journal.entries_since(offset)
    }

    /// Full-table scan for entries at or after `offset`, sorted by offset
    pub fn scan_since(&self, offset: u64) -> Vec<IndexEntry<F::Key>> {
        self.table.entries_from(offset)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    // =========================================================================
    // Persistence & Lifecycle
    // =========================================================================

    /// Write a snapshot now, outside the background schedule
    pub fn persist(&self) -> Result<PersistStats> {
        self.persistor.write()
    }

    /// Write a final snapshot and reject further mutation
    ///
    /// Mutation is rejected from the first call on, even if the final write
    /// fails. A failed write is returned and the next call retries it; once
    /// a final snapshot is on disk later calls return `Ok(())`. The writer
    /// lock is held across the write, so the snapshot holds every accepted
    /// add. The background schedule is left to the scheduler's owner.
    pub fn close(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        self.closed.store(true, Ordering::Release);
        if self.final_written.load(Ordering::Acquire) {
            return Ok(());
        }

        let stats = self.persistor.write()?;
        self.final_written.store(true, Ordering::Release);
        tracing::info!(
            path = %self.persistor.path().display(),
            entries = stats.entries,
            end_offset = stats.end_offset,
            "Closed index"
        );
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn snapshot_path(&self) -> &Path {
        self.persistor.path()
    }
}
