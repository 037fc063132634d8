//! Index entry definitions
//!
//! Defines the record stored for each key.

use serde::{Deserialize, Serialize};

/// Record has been deleted
pub const FLAG_DELETED: u8 = 0x01;

/// Record's time-to-live was updated after the original put
pub const FLAG_TTL_UPDATED: u8 = 0x02;

/// Time-to-live value meaning "never expires"
pub const TTL_INFINITE: i64 = -1;

/// Location and metadata of one blob in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexValue {
    /// Byte length of the blob in the log
    pub size: u64,

    /// Byte offset of the blob's start in the log
    pub offset: u64,

    /// Record state bits (`FLAG_*`)
    pub flags: u8,

    /// Expiry, `TTL_INFINITE` for none
    pub time_to_live: i64,
}

impl IndexValue {
    pub fn new(size: u64, offset: u64, flags: u8, time_to_live: i64) -> Self {
        Self {
            size,
            offset,
            flags,
            time_to_live,
        }
    }

    /// Offset just past the blob
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }

    pub fn is_deleted(&self) -> bool {
        self.flags & FLAG_DELETED != 0
    }

    pub fn is_ttl_updated(&self) -> bool {
        self.flags & FLAG_TTL_UPDATED != 0
    }

    pub fn expires(&self) -> bool {
        self.time_to_live != TTL_INFINITE
    }

    /// Same location with the given flag bits set
    pub fn with_flags(&self, flags: u8) -> Self {
        Self {
            flags: self.flags | flags,
            ..*self
        }
    }
}

/// A key and its value, the unit of mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry<K> {
    pub key: K,
    pub value: IndexValue,
}

impl<K> IndexEntry<K> {
    pub fn new(key: K, value: IndexValue) -> Self {
        Self { key, value }
    }
}
