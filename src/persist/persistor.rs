//! Snapshot persistor
//!
//! Owns the snapshot file of one index. Writes go to `<file>.tmp` and are
//! renamed over `<file>` only once fully flushed, so a crash at any point
//! leaves the previous snapshot intact.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{IndexError, Result};
use crate::index::PERSIST_JOB_NAME;
use crate::key::KeyFactory;
use crate::log::Log;
use crate::scheduler::Job;
use crate::table::IndexTable;

use super::{format, TEMP_SUFFIX};

/// Outcome of a successful snapshot write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistStats {
    /// Number of entry lines written
    pub entries: usize,

    /// End offset declared by the snapshot
    pub end_offset: u64,
}

/// Outcome of a successful snapshot read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryStats {
    /// Number of entries installed into the table
    pub entries_recovered: usize,

    /// End offset restored from the sentinel line
    pub end_offset: u64,
}

/// Serializes and recovers the full index state
///
/// `read()` and `write()` share `lock`, so at most one of them touches the
/// snapshot files at a time.
pub struct Persistor<F: KeyFactory> {
    path: PathBuf,
    temp_path: PathBuf,
    table: Arc<IndexTable<F::Key>>,
    factory: F,
    log: Arc<dyn Log>,
    lock: Mutex<()>,
}

impl<F: KeyFactory> Persistor<F> {
    /// Create a persistor for `path`, removing any stale staging file
    pub fn new(
        path: impl Into<PathBuf>,
        table: Arc<IndexTable<F::Key>>,
        factory: F,
        log: Arc<dyn Log>,
    ) -> Result<Self> {
        let path = path.into();
        let temp_path = Self::temp_path_for(&path);

        match fs::remove_file(&temp_path) {
            Ok(()) => {
                tracing::debug!(path = %temp_path.display(), "Removed stale snapshot staging file");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            path,
            temp_path,
            table,
            factory,
            log,
            lock: Mutex::new(()),
        })
    }

    /// Write a full snapshot and swap it into place
    ///
    /// On failure the staging file is removed and the live snapshot is left
    /// as it was.
    pub fn write(&self) -> Result<PersistStats> {
        let _guard = self.lock.lock();
        tracing::debug!(path = %self.path.display(), "Writing index snapshot");

        match self.write_locked() {
            Ok(stats) => {
                tracing::info!(
                    path = %self.path.display(),
                    entries = stats.entries,
                    end_offset = stats.end_offset,
                    "Completed writing index snapshot"
                );
                Ok(stats)
            }
            Err(e) => {
                let _ = fs::remove_file(&self.temp_path);
                Err(e)
            }
        }
    }

    fn write_locked(&self) -> Result<PersistStats> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.temp_path)?;
        let mut writer = BufWriter::new(file);

        format::write_version(&mut writer)?;

        // End offset is captured before the map is copied
        let (end_offset, entries) = self.table.snapshot();

        // Every log byte up to end_offset must be durable before we claim it
        self.log.flush()?;

        for (key, value) in &entries {
            format::write_entry(&mut writer, key, value)?;
        }
        format::write_end_offset(&mut writer, end_offset)?;

        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&self.temp_path, &self.path)?;
        sync_parent_dir(&self.path)?;

        Ok(PersistStats {
            entries: entries.len(),
            end_offset,
        })
    }

    /// Load the snapshot into the table
    ///
    /// The file is fully decoded before the table is touched, so a failed
    /// read leaves the table unchanged.
    pub fn read(&self) -> Result<RecoveryStats> {
        let _guard = self.lock.lock();
        tracing::info!(path = %self.path.display(), "Reading index snapshot");

        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(IndexError::SnapshotNotFound(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot = format::read_snapshot(BufReader::new(file), &self.factory)?;
        let stats = RecoveryStats {
            entries_recovered: snapshot.entries.len(),
            end_offset: snapshot.end_offset,
        };
        self.table.replace(snapshot.entries, snapshot.end_offset);

        Ok(stats)
    }

    /// Path of the live snapshot
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the staging file
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    fn temp_path_for(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(TEMP_SUFFIX);
        PathBuf::from(name)
    }
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => File::open(dir)?.sync_all(),
        _ => Ok(()),
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}

// =============================================================================
// Background Job
// =============================================================================

/// Scheduled snapshot job: write, log and swallow failures
pub struct PersistJob<F: KeyFactory> {
    persistor: Arc<Persistor<F>>,
}

impl<F: KeyFactory> PersistJob<F> {
    pub fn new(persistor: Arc<Persistor<F>>) -> Self {
        Self { persistor }
    }
}

impl<F: KeyFactory> Job for PersistJob<F> {
    fn name(&self) -> &str {
        PERSIST_JOB_NAME
    }

    fn run(&self) {
        if let Err(e) = self.persistor.write() {
            tracing::warn!(
                path = %self.persistor.path().display(),
                error = %e,
                "Error while persisting the index, will retry next period"
            );
        }
    }
}
