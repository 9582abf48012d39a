//! Key/value persistence backing settings and page-storage backups.
//!
//! The store is deliberately forgiving on the read side: a missing key, a
//! missing file, or an unreadable file all read as "nothing there", so the
//! engine falls back to defaults instead of failing hard.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

/// Asynchronous key/value store of JSON values.
pub trait Storage: Send + Sync + 'static {
    /// Read one key. Missing keys and unreadable backends read as None.
    fn get(&self, key: &str) -> impl Future<Output = Option<Value>> + Send;

    /// Write one key.
    fn set(&self, key: &str, value: Value) -> impl Future<Output = Result<()>> + Send;

    /// Delete one key. Deleting an absent key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}

impl<S: Storage> Storage for std::sync::Arc<S> {
    fn get(&self, key: &str) -> impl Future<Output = Option<Value>> + Send {
        S::get(self, key)
    }

    fn set(&self, key: &str, value: Value) -> impl Future<Output = Result<()>> + Send {
        S::set(self, key, value)
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send {
        S::remove(self, key)
    }
}

/// File-backed store: one pretty-printed JSON object per store, kept under
/// the XDG state dir like the rest of MDR's persistent state.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Default store location: `~/.local/state/mdr/storage.json`.
    pub fn open_default() -> Result<Self> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("mdr")?;
        let path = xdg_dirs
            .place_state_file("storage.json")
            .context("create state dir for storage")?;
        Ok(Self::at_path(path))
    }

    /// Store backed by an explicit file path.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn read_all(&self) -> Map<String, Value> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Map::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "storage read failed ({e}), treating as empty");
                return Map::new();
            }
        };
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => map,
            _ => {
                tracing::warn!(path = %self.path.display(), "storage file is not a JSON object, treating as empty");
                Map::new()
            }
        }
    }

    async fn write_all(&self, map: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let json = serde_json::to_vec_pretty(&Value::Object(map.clone()))
            .context("serialize storage")?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("write storage: {}", self.path.display()))?;
        Ok(())
    }
}

impl Storage for FileStorage {
    async fn get(&self, key: &str) -> Option<Value> {
        self.read_all().await.remove(key)
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut map = self.read_all().await;
        map.insert(key.to_string(), value);
        self.write_all(&map).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.read_all().await;
        if map.remove(key).is_some() {
            self.write_all(&map).await?;
        }
        Ok(())
    }
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    map: Mutex<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Option<Value> {
        self.map.lock().unwrap().get(key).cloned()
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.map.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.map.lock().unwrap().remove(key);
        Ok(())
    }
}
