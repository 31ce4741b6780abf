//! File registry state machine
//!
//! A content hash is either absent or holds exactly one [`FileRecord`].
//! Records enter only through [`FileRegistry::upload_file`] and leave only
//! through [`FileRegistry::delete_file`], which is restricted to the owner.

use crate::config::{AccessCounting, RegistryConfig};
use crate::errors::*;
use crate::store::{FileStore, MemoryFileStore};
use crate::types::*;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// File Registry
///
/// Wraps a [`FileStore`] and serializes every check-then-mutate sequence
/// behind a single transition lock, so two uploads of the same hash can
/// never both observe it as absent.
pub struct FileRegistry<S: FileStore = MemoryFileStore> {
    store: S,
    config: RegistryConfig,
    transition: Mutex<()>,
}

impl FileRegistry<MemoryFileStore> {
    /// Create a registry over a fresh in-memory store with default settings.
    pub fn in_memory() -> Self {
        Self::new(MemoryFileStore::new())
    }
}

impl Default for FileRegistry<MemoryFileStore> {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl<S: FileStore> FileRegistry<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, RegistryConfig::default())
    }

    pub fn with_config(store: S, config: RegistryConfig) -> Self {
        Self {
            store,
            config,
            transition: Mutex::new(()),
        }
    }

    /// Register a new file owned by `caller`.
    pub fn upload_file(
        &self,
        caller: &ActorId,
        hash: &ContentHash,
        size: u64,
        category: u64,
    ) -> Result<()> {
        hash.validate()?;

        let _guard = self.transition.lock();
        if self.store.get(hash)?.is_some() {
            warn!(%hash, %caller, "upload rejected: file already exists");
            return Err(RegistryError::FileAlreadyExists {
                hash: hash.to_string(),
            });
        }

        self.store
            .put(hash, FileRecord::new(caller.clone(), size, category))?;
        info!(%hash, owner = %caller, size, category, "file uploaded");
        Ok(())
    }

    /// Remove a file. Existence is checked before ownership.
    pub fn delete_file(&self, caller: &ActorId, hash: &ContentHash) -> Result<()> {
        hash.validate()?;

        let _guard = self.transition.lock();
        let record = match self.store.get(hash)? {
            Some(record) => record,
            None => {
                warn!(%hash, %caller, "delete rejected: file does not exist");
                return Err(self.missing(hash));
            }
        };

        if !record.is_owned_by(caller) {
            warn!(%hash, %caller, owner = %record.owner, "delete rejected: caller is not owner");
            return Err(RegistryError::NotOwner {
                hash: hash.to_string(),
            });
        }

        self.store.remove(hash)?;
        info!(%hash, owner = %caller, "file deleted");
        Ok(())
    }

    pub fn get_file_owner(&self, hash: &ContentHash) -> Result<ActorId> {
        Ok(self.read_counted(hash)?.owner)
    }

    pub fn get_file_category(&self, hash: &ContentHash) -> Result<u64> {
        Ok(self.read_counted(hash)?.category)
    }

    pub fn get_file_size(&self, hash: &ContentHash) -> Result<u64> {
        Ok(self.read_counted(hash)?.size)
    }

    /// Current access counter. Observing the counter is never itself counted.
    pub fn get_file_number_accesses(&self, hash: &ContentHash) -> Result<u64> {
        hash.validate()?;
        Ok(self.require(hash)?.access_count)
    }

    /// Full record for `hash`; counted like the field accessors.
    pub fn get_file(&self, hash: &ContentHash) -> Result<FileRecord> {
        self.read_counted(hash)
    }

    pub fn file_exists(&self, hash: &ContentHash) -> Result<bool> {
        hash.validate()?;
        Ok(self.store.get(hash)?.is_some())
    }

    pub fn file_count(&self) -> Result<u64> {
        Ok(self.store.count()?)
    }

    /// List records in ascending hash order.
    pub fn list_files(&self, offset: usize, limit: usize) -> Result<Vec<FileSummary>> {
        Ok(self.store.list(offset, limit)?)
    }

    pub fn list_files_by_owner(&self, owner: &ActorId) -> Result<Vec<FileSummary>> {
        let all = self.store.list(0, usize::MAX)?;
        Ok(all
            .into_iter()
            .filter(|summary| summary.record.is_owned_by(owner))
            .collect())
    }

    pub fn flush(&self) -> Result<()> {
        Ok(self.store.flush()?)
    }

    fn read_counted(&self, hash: &ContentHash) -> Result<FileRecord> {
        hash.validate()?;

        match self.config.access_counting {
            AccessCounting::Fixed => {
                let record = self.require(hash)?;
                debug!(%hash, "file read");
                Ok(record)
            }
            AccessCounting::IncrementOnRead => {
                let _guard = self.transition.lock();
                let mut record = self.require(hash)?;
                record.access_count = record.access_count.saturating_add(1);
                self.store.put(hash, record.clone())?;
                debug!(%hash, accesses = record.access_count, "file read (counted)");
                Ok(record)
            }
        }
    }

    fn require(&self, hash: &ContentHash) -> Result<FileRecord> {
        self.store.get(hash)?.ok_or_else(|| self.missing(hash))
    }

    fn missing(&self, hash: &ContentHash) -> RegistryError {
        RegistryError::FileDoesNotExist {
            hash: hash.to_string(),
        }
    }
}
