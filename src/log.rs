//! Log collaborator
//!
//! The index only needs one thing from the append-only blob log: a way to
//! make every byte written so far durable before a snapshot claims it.

use std::fs::File;
use std::io;
use std::sync::Arc;

/// Append-only log, as seen by the index
pub trait Log: Send + Sync {
    /// Durably persist all previously written bytes
    fn flush(&self) -> io::Result<()>;
}

impl Log for File {
    fn flush(&self) -> io::Result<()> {
        self.sync_data()
    }
}

impl<L: Log + ?Sized> Log for Arc<L> {
    fn flush(&self) -> io::Result<()> {
        (**self).flush()
    }
}
