//! JSON-file backed key-value store

use super::KeyValueStore;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

type Document = BTreeMap<String, String>;

/// Persists all keys in a single JSON object on disk.
///
/// Writes land in a temp file that is renamed over the original.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self, key: &str) -> Result<Document> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => {
                return Err(Error::StoreRead {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Document::new());
        }

        serde_json::from_str(&content).map_err(|e| Error::StoreRead {
            key: key.to_string(),
            reason: format!("corrupt store file {}: {}", self.path.display(), e),
        })
    }

    async fn write_document(&self, key: &str, document: &Document) -> Result<()> {
        let write_err = |e: std::io::Error| Error::StoreWrite {
            key: key.to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
            }
        }

        let content = serde_json::to_string_pretty(document)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content).await.map_err(write_err)?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(write_err)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document(key).await?;
        Ok(document.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document(key).await.map_err(|e| Error::StoreWrite {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        document.insert(key.to_string(), value.to_string());
        self.write_document(key, &document).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document(key).await.map_err(|e| Error::StoreWrite {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        if document.remove(key).is_some() {
            self.write_document(key, &document).await?;
        }
        Ok(())
    }
}
