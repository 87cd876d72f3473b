//! # Flat File Storage
//!
//! Small JSON documents kept on disk (subscribers, visitor logs).
//!
//! ## Implementation
//!
//! - [`Store`] only knows how to load and save a whole document
//! - [`Repository`] owns a store and funnels every read-modify-write through one async mutex, so two
//!   requests appending at the same time cannot lose each other's entry
//! - Reads never fail: a missing file is created with the default document, a corrupt one is
//!   moved to `<path>.bak`, logged and treated as empty
use std::{future::Future, io::ErrorKind, marker::PhantomData, path::PathBuf};

use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::{fs, sync::Mutex as AsyncMutex};
use tracing::warn;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait Store: Send + Sync {
    type Record: Send + Sync;

    fn load(&self) -> impl Future<Output = Self::Record> + Send;

    fn save(&self, record: &Self::Record) -> impl Future<Output = Result<(), StoreError>> + Send;
}

pub struct JsonFileStore<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".bak");
        PathBuf::from(name)
    }

    /// Moves an unreadable file to `<path>.bak` so the next save does not destroy it.
    async fn set_aside(&self) {
        let backup = self.backup_path();

        match fs::rename(&self.path, &backup).await {
            Ok(()) => warn!(
                "Moved unreadable {} to {}, starting from an empty document",
                self.path.display(),
                backup.display()
            ),
            Err(e) => warn!(
                "Failed to back up {}, the next write will overwrite it: {e}",
                self.path.display()
            ),
        }
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl<T> Store for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Default + Send + Sync,
{
    type Record = T;

    async fn load(&self) -> T {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Failed to parse {}: {e}", self.path.display());
                    self.set_aside().await;
                    T::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let record = T::default();
                if let Err(e) = self.save(&record).await {
                    warn!("Failed to create {}: {e}", self.path.display());
                }
                record
            }
            Err(e) => {
                warn!("Failed to read {}: {e}", self.path.display());
                T::default()
            }
        }
    }

    async fn save(&self, record: &T) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(record)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        fs::write(&self.path, contents)
            .await
            .map_err(|e| self.io_error(e))
    }
}

/// In-process store, nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore<T> {
    record: Mutex<T>,
}

impl<T> MemoryStore<T> {
    pub fn new(record: T) -> Self {
        Self {
            record: Mutex::new(record),
        }
    }
}

impl<T: Clone + Send + Sync> Store for MemoryStore<T> {
    type Record = T;

    async fn load(&self) -> T {
        self.record.lock().clone()
    }

    async fn save(&self, record: &T) -> Result<(), StoreError> {
        *self.record.lock() = record.clone();
        Ok(())
    }
}

/// Serializes writers of a [`Store`].
pub struct Repository<S> {
    store: S,
    writer: AsyncMutex<()>,
}

impl<S: Store> Repository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            writer: AsyncMutex::new(()),
        }
    }

    pub async fn load(&self) -> S::Record {
        self.store.load().await
    }

    pub async fn update<R>(&self, change: impl FnOnce(&mut S::Record) -> R) -> Result<R, StoreError> {
        let _writer = self.writer.lock().await;

        let mut record = self.store.load().await;
        let result = change(&mut record);
        self.store.save(&record).await?;

        Ok(result)
    }
}
