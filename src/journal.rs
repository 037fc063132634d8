//! Journal
//!
//! Bounded window of recently applied entries, used to answer "what changed
//! since end offset X" without scanning the whole index.
//!
//! ## Retention
//! Every record is tagged with its application position: the end offset the
//! add that applied it advanced the index to. Queries filter on that tag, not
//! on the entry's own log offset, so a flag update that keeps the original
//! location still shows up for a consumer that has seen the older end offset.
//!
//! The journal keeps the last `capacity` records in application order. It
//! also tracks a `floor`: the lowest end offset from which the window is
//! known to be complete. Queries below the floor get an explicit
//! `JournalRead::Gap` so the caller knows to fall back to the full index
//! (`Index::scan_since`) or to the log itself.
//!
//! ```text
//!   evicted          retained window
//! ┌─────────┬──────────────────────────────┐
//! │ ..@120  │ e(@180) e(@260) e(@300)      │
//! └─────────┴──────────────────────────────┘
//!           ▲ floor = 120  (last evicted position)
//! ```

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::entry::IndexEntry;

/// Outcome of a journal query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalRead<K> {
    /// Every entry applied after the requested end offset, in application order
    Entries(Vec<IndexEntry<K>>),

    /// The window no longer covers `requested`; entries may be missing
    Gap { requested: u64, floor: u64 },
}

impl<K> JournalRead<K> {
    pub fn is_gap(&self) -> bool {
        matches!(self, JournalRead::Gap { .. })
    }

    /// The entries, or `None` on a gap
    pub fn into_entries(self) -> Option<Vec<IndexEntry<K>>> {
        match self {
            JournalRead::Entries(entries) => Some(entries),
            JournalRead::Gap { .. } => None,
        }
    }
}

struct JournalRecord<K> {
    applied_at: u64,
    entry: IndexEntry<K>,
}

struct JournalInner<K> {
    records: VecDeque<JournalRecord<K>>,
    floor: u64,
}

/// Count-bounded recent-change window
pub struct Journal<K> {
    capacity: usize,
    inner: Mutex<JournalInner<K>>,
}

impl<K: Clone> Journal<K> {
    /// Create an empty journal complete from `floor` onwards
    pub fn new(capacity: usize, floor: u64) -> Self {
        Self {
            capacity,
            inner: Mutex::new(JournalInner {
                records: VecDeque::with_capacity(capacity.min(4096)),
                floor,
            }),
        }
    }

    /// Record an entry applied by the add that moved the end offset to
    /// `applied_at`, evicting the oldest if full
    pub fn record(&self, entry: IndexEntry<K>, applied_at: u64) {
        let mut inner = self.inner.lock();
        inner.records.push_back(JournalRecord { applied_at, entry });
        while inner.records.len() > self.capacity {
            if let Some(evicted) = inner.records.pop_front() {
                inner.floor = inner.floor.max(evicted.applied_at);
            }
        }
    }

    /// Entries applied after the index reached end offset `offset`
    pub fn entries_since(&self, offset: u64) -> JournalRead<K> {
        let inner = self.inner.lock();
        if offset < inner.floor {
            return JournalRead::Gap {
                requested: offset,
                floor: inner.floor,
            };
        }

        JournalRead::Entries(
            inner
                .records
                .iter()
                .filter(|r| r.applied_at > offset)
                .map(|r| r.entry.clone())
                .collect(),
        )
    }

    /// Drop every record; the window is complete from `floor` onwards
    pub fn reset(&self, floor: u64) {
        let mut inner = self.inner.lock();
        inner.records.clear();
        inner.floor = floor;
    }

    pub fn floor(&self) -> u64 {
        self.inner.lock().floor
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
