use std::cell::RefCell;
use std::collections::BTreeMap;
#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend is unavailable: {0}")]
    Unavailable(String),

    #[error("failed reading {key}: {message}")]
    Read { key: String, message: String },

    #[error("failed writing {key}: {message}")]
    Write { key: String, message: String },

    #[error("failed decoding {key}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed encoding value")]
    Encode(#[from] serde_json::Error),

    #[error("io error on {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Asynchronous string key-value storage. Everything runs on one event
/// queue, so implementations need not be `Send`.
#[async_trait(?Send)]
pub trait Storage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RefCell::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        debug!(key, bytes = value.len(), "memory storage write");
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key inside a data directory. Writes go through a
/// temp file that is persisted over the target.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct FileStorage {
    pub data_dir: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStorage {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> Result<Self, StorageError> {
        let data_dir = data_dir.to_path_buf();
        std::fs::create_dir_all(&data_dir).map_err(|source| StorageError::Io {
            path: data_dir.display().to_string(),
            source,
        })?;
        tracing::info!(data_dir = %data_dir.display(), "opened file storage");
        Ok(Self { data_dir })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.data_dir.join(format!("{safe}.json"))
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[async_trait(?Send)]
impl Storage for FileStorage {
    #[tracing::instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::Read {
                key: key.to_string(),
                message: err.to_string(),
            }),
        }
    }

    #[tracing::instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        use std::io::Write;

        let path = self.path_for(key);
        debug!(file = %path.display(), bytes = value.len(), "saving atomically");

        let write_err = |message: String| StorageError::Write {
            key: key.to_string(),
            message,
        };

        let mut temp =
            tempfile::NamedTempFile::new_in(&self.data_dir).map_err(|e| write_err(e.to_string()))?;
        temp.write_all(value.as_bytes())
            .map_err(|e| write_err(e.to_string()))?;
        temp.flush().map_err(|e| write_err(e.to_string()))?;
        temp.persist(&path)
            .map_err(|e| write_err(format!("failed to persist {}: {}", path.display(), e)))?;
        Ok(())
    }
}
