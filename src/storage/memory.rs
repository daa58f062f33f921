//! In-process key-value store

use super::KeyValueStore;
use crate::error::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

/// Store operation, used to simulate an unavailable backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Get,
    Set,
    Remove,
}

#[derive(Default)]
struct Faults {
    get: AtomicBool,
    set: AtomicBool,
    remove: AtomicBool,
    write_keys: Mutex<HashSet<String>>,
}

impl Faults {
    fn flag(&self, op: StoreOp) -> &AtomicBool {
        match op {
            StoreOp::Get => &self.get,
            StoreOp::Set => &self.set,
            StoreOp::Remove => &self.remove,
        }
    }

    fn write_keys(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.write_keys.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Map-backed store. Clones share the same entries.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
    faults: Arc<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `op` fail until [`MemoryStore::clear_faults`]
    pub fn inject_fault(&self, op: StoreOp) {
        self.faults.flag(op).store(true, Ordering::SeqCst);
    }

    /// Make sets and removes of `key` fail, leaving other keys writable
    pub fn inject_write_fault_for(&self, key: impl Into<String>) {
        self.faults.write_keys().insert(key.into());
    }

    pub fn clear_faults(&self) {
        for op in [StoreOp::Get, StoreOp::Set, StoreOp::Remove] {
            self.faults.flag(op).store(false, Ordering::SeqCst);
        }
        self.faults.write_keys().clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn check(&self, op: StoreOp, key: &str) -> Result<()> {
        let key_fault = op != StoreOp::Get && self.faults.write_keys().contains(key);
        if !key_fault && !self.faults.flag(op).load(Ordering::SeqCst) {
            return Ok(());
        }
        let reason = "store unavailable".to_string();
        let key = key.to_string();
        Err(match op {
            StoreOp::Get => Error::StoreRead { key, reason },
            StoreOp::Set | StoreOp::Remove => Error::StoreWrite { key, reason },
        })
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check(StoreOp::Get, key)?;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check(StoreOp::Set, key)?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check(StoreOp::Remove, key)?;
        self.entries.write().await.remove(key);
        Ok(())
    }
}
