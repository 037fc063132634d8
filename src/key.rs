//! Index keys
//!
//! The index is generic over its key type. A key's `Display` output is its
//! canonical serialized form (what the snapshot stores), and a `KeyFactory`
//! turns that form back into a key during recovery.

use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

/// Opaque, hashable blob identifier
pub trait IndexKey:
    Clone + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync + 'static
{
}

impl<T> IndexKey for T where
    T: Clone + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync + 'static
{
}

/// Parses keys from their serialized form
pub trait KeyFactory: Send + Sync + 'static {
    type Key: IndexKey;

    /// Fails with `IndexError::KeyParse` on malformed input
    fn parse_key(&self, serialized: &str) -> Result<Self::Key>;
}

// =============================================================================
// Blob Id Key Scheme
// =============================================================================

/// Longest accepted blob id
pub const MAX_BLOB_ID_LEN: usize = 256;

/// Default key scheme: a short printable token
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlobId(String);

impl BlobId {
    /// Validate and wrap a blob id
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(IndexError::KeyParse("blob id is empty".to_string()));
        }
        if id.len() > MAX_BLOB_ID_LEN {
            return Err(IndexError::KeyParse(format!(
                "blob id is {} bytes, limit is {}",
                id.len(),
                MAX_BLOB_ID_LEN
            )));
        }
        if let Some(c) = id.chars().find(|c| !Self::is_id_char(*c)) {
            return Err(IndexError::KeyParse(format!(
                "invalid character {:?} in blob id {:?}",
                c, id
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_id_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for BlobId {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Factory for `BlobId` keys
#[derive(Debug, Clone, Copy, Default)]
pub struct BlobIdFactory;

impl KeyFactory for BlobIdFactory {
    type Key = BlobId;

    fn parse_key(&self, serialized: &str) -> Result<BlobId> {
        BlobId::new(serialized)
    }
}
