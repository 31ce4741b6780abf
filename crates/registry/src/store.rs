//! Keyed storage backends for file records.

use crate::types::{ContentHash, FileRecord, FileSummary};
use anyhow::{Context, Result};
use parking_lot::RwLock;
use sled::{Db, Tree};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Trait for file record storage backends.
///
/// Backends are plain key/value maps; ownership and existence rules are
/// enforced by [`crate::FileRegistry`].
pub trait FileStore: Send + Sync {
    /// Retrieve a record by content hash.
    fn get(&self, hash: &ContentHash) -> Result<Option<FileRecord>>;

    /// Insert or replace a record.
    fn put(&self, hash: &ContentHash, record: FileRecord) -> Result<()>;

    /// Remove a record, returning it if it was present.
    fn remove(&self, hash: &ContentHash) -> Result<Option<FileRecord>>;

    /// Count stored records.
    fn count(&self) -> Result<u64>;

    /// List records in ascending key order (paginated).
    fn list(&self, offset: usize, limit: usize) -> Result<Vec<FileSummary>>;

    /// Persist pending writes, if the backend buffers any.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// In-memory record storage (for testing and throwaway runs).
#[derive(Clone, Default)]
pub struct MemoryFileStore {
    records: Arc<RwLock<BTreeMap<ContentHash, FileRecord>>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileStore for MemoryFileStore {
    fn get(&self, hash: &ContentHash) -> Result<Option<FileRecord>> {
        Ok(self.records.read().get(hash).cloned())
    }

    fn put(&self, hash: &ContentHash, record: FileRecord) -> Result<()> {
        self.records.write().insert(hash.clone(), record);
        Ok(())
    }

    fn remove(&self, hash: &ContentHash) -> Result<Option<FileRecord>> {
        Ok(self.records.write().remove(hash))
    }

    fn count(&self) -> Result<u64> {
        Ok(self.records.read().len() as u64)
    }

    fn list(&self, offset: usize, limit: usize) -> Result<Vec<FileSummary>> {
        Ok(self
            .records
            .read()
            .iter()
            .skip(offset)
            .take(limit)
            .map(|(hash, record)| FileSummary {
                hash: hash.clone(),
                record: record.clone(),
            })
            .collect())
    }
}

/// Sled-backed record storage. Records are JSON-encoded in the `files` tree.
pub struct SledFileStore {
    db: Db,
    files: Tree,
}

impl SledFileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let db = sled::open(path)
            .with_context(|| format!("failed to open sled database at {}", path.display()))?;
        let files = db.open_tree("files")?;
        tracing::debug!(path = %path.display(), records = files.len(), "opened file store");
        Ok(Self { db, files })
    }
}

impl FileStore for SledFileStore {
    fn get(&self, hash: &ContentHash) -> Result<Option<FileRecord>> {
        self.files
            .get(hash.as_bytes())?
            .map(|v| serde_json::from_slice(&v))
            .transpose()
            .map_err(Into::into)
    }

    fn put(&self, hash: &ContentHash, record: FileRecord) -> Result<()> {
        let data = serde_json::to_vec(&record)?;
        self.files.insert(hash.as_bytes(), data)?;
        Ok(())
    }

    fn remove(&self, hash: &ContentHash) -> Result<Option<FileRecord>> {
        self.files
            .remove(hash.as_bytes())?
            .map(|v| serde_json::from_slice(&v))
            .transpose()
            .map_err(Into::into)
    }

    fn count(&self) -> Result<u64> {
        Ok(self.files.len() as u64)
    }

    fn list(&self, offset: usize, limit: usize) -> Result<Vec<FileSummary>> {
        self.files
            .iter()
            .skip(offset)
            .take(limit)
            .map(|entry| {
                let (key, value) = entry?;
                let hash = String::from_utf8(key.to_vec())
                    .context("stored content hash is not valid UTF-8")?;
                Ok(FileSummary {
                    hash: ContentHash(hash),
                    record: serde_json::from_slice(&value)?,
                })
            })
            .collect()
    }

    fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActorId;
    use tempfile::TempDir;

    fn record(owner: &str, size: u64) -> FileRecord {
        FileRecord::new(ActorId::new(owner), size, 0)
    }

    fn exercise_backend<S: FileStore>(store: &S) {
        let a = ContentHash::new("a");
        let b = ContentHash::new("b");
        let c = ContentHash::new("c");

        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.get(&a).unwrap(), None);

        store.put(&b, record("bob", 2)).unwrap();
        store.put(&a, record("alice", 1)).unwrap();
        store.put(&c, record("carol", 3)).unwrap();
        assert_eq!(store.count().unwrap(), 3);
        assert_eq!(store.get(&a).unwrap(), Some(record("alice", 1)));

        // Listing is ordered by key regardless of insertion order
        let page = store.list(0, 2).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].hash, a);
        assert_eq!(page[1].hash, b);
        let rest = store.list(2, 10).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].hash, c);

        assert_eq!(store.remove(&b).unwrap(), Some(record("bob", 2)));
        assert_eq!(store.remove(&b).unwrap(), None);
        assert_eq!(store.get(&b).unwrap(), None);
        assert_eq!(store.count().unwrap(), 2);

        store.flush().unwrap();
    }

    #[test]
    fn test_memory_store_basic_operations() {
        exercise_backend(&MemoryFileStore::new());
    }

    #[test]
    fn test_sled_store_basic_operations() {
        let dir = TempDir::new().expect("temp dir");
        let store = SledFileStore::open(dir.path()).expect("sled store");
        exercise_backend(&store);
    }

    #[test]
    fn test_memory_store_clones_share_state() {
        let store = MemoryFileStore::new();
        let clone = store.clone();
        let hash = ContentHash::new("shared");

        store.put(&hash, record("alice", 1)).unwrap();
        assert_eq!(clone.get(&hash).unwrap(), Some(record("alice", 1)));
    }
}
