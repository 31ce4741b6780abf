//! Record data model for registered files.

use crate::errors::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque content identifier used as the registry key (e.g. an IPFS CID).
///
/// The registry never derives or checks it beyond requiring it to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Wrap a caller-supplied identifier without validation.
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Wrap a caller-supplied identifier, rejecting the empty string.
    pub fn parse(hash: impl Into<String>) -> Result<Self> {
        let hash = Self(hash.into());
        hash.validate()?;
        Ok(hash)
    }

    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(RegistryError::InvalidContentHash);
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of the actor performing an operation.
///
/// Only equality is meaningful; the registry attaches no structure to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata stored for one registered content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Actor that uploaded the file. Set once, never reassigned.
    pub owner: ActorId,

    /// Declared size in bytes (not checked against real content).
    pub size: u64,

    /// Caller-defined classification tag.
    pub category: u64,

    /// Number of recorded accesses, starting at 1 for the upload itself.
    pub access_count: u64,
}

impl FileRecord {
    /// Create the record produced by a successful upload.
    pub fn new(owner: ActorId, size: u64, category: u64) -> Self {
        Self {
            owner,
            size,
            category,
            access_count: 1,
        }
    }

    pub fn is_owned_by(&self, actor: &ActorId) -> bool {
        &self.owner == actor
    }
}

/// A record together with its key, as returned by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub hash: ContentHash,
    #[serde(flatten)]
    pub record: FileRecord,
}
