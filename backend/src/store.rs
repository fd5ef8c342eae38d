//! Whole-collection persistence.
//!
//! A store holds one ordered collection and only ever reads or replaces it
//! in full. There is no caching: every call goes back to the backing
//! resource.

use std::fs;
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::warn;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed collection in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

/// Load/save primitives over a full collection of `T`.
pub trait CollectionStore<T>: Send + Sync {
    /// Read the collection. A missing or empty resource is an empty
    /// collection; anything unreadable is an error.
    fn try_load(&self) -> StoreResult<Vec<T>>;

    /// Replace the stored collection with `items`.
    fn save(&self, items: &[T]) -> StoreResult<()>;

    /// Read the collection, treating any failure as empty.
    fn load(&self) -> Vec<T> {
        self.try_load().unwrap_or_else(|e| {
            warn!("Treating collection as empty: {e}");
            Vec::new()
        })
    }
}

/// A collection persisted as one pretty-printed JSON array in a file.
pub struct JsonFileStore<T> {
    path: PathBuf,
    _item: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            _item: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl<T> CollectionStore<T> for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned,
{
    fn try_load(&self) -> StoreResult<Vec<T>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.io_err(err)),
        };
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&data).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, items: &[T]) -> StoreResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| self.io_err(e))?;

        let data = serde_json::to_string_pretty(items).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;

        // Write beside the target and rename over it so readers never see a
        // half-written array.
        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| self.io_err(e))?;
        tmp.write_all(data.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| self.io_err(e))?;
        tmp.persist(&self.path).map_err(|e| StoreError::Persist {
            path: self.path.clone(),
            source: e.error,
        })?;
        Ok(())
    }
}

/// In-memory store, for tests and for running without a data directory.
pub struct MemoryStore<T> {
    items: RwLock<Vec<T>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    pub fn with_items(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CollectionStore<T> for MemoryStore<T>
where
    T: Clone + Send + Sync,
{
    fn try_load(&self) -> StoreResult<Vec<T>> {
        let items = self
            .items
            .read()
            .map_err(|_| StoreError::LockPoisoned("memory store read"))?;
        Ok(items.clone())
    }

    fn save(&self, items: &[T]) -> StoreResult<()> {
        let mut stored = self
            .items
            .write()
            .map_err(|_| StoreError::LockPoisoned("memory store write"))?;
        *stored = items.to_vec();
        Ok(())
    }
}
