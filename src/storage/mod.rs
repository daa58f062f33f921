//! Persistent key-value boundary and the typed session store on top of it

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::{MemoryStore, StoreOp};

use crate::auth::models::{Token, UserRecord};
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use std::future::Future;

/// Asynchronous string key-value store.
///
/// Implementations are expected to serialize operations per key.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key is absent
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;

    /// Remove a key. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Key names the session lives under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub token: String,
    pub user: String,
    pub legacy_token: Vec<String>,
    pub legacy_user: Vec<String>,
    /// Auxiliary keys never read here but removed on every clear
    pub cleared: Vec<String>,
}

impl StorageKeys {
    pub fn new(namespace: &str) -> Self {
        Self {
            token: format!("{}:token", namespace),
            user: format!("{}:user", namespace),
            legacy_token: Vec::new(),
            legacy_user: Vec::new(),
            cleared: default_cleared_keys(namespace),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        let keys = Self::new(&config.namespace);
        Self {
            legacy_token: config.legacy_token_keys.clone(),
            legacy_user: config.legacy_user_keys.clone(),
            cleared: config.cleared_keys.clone().unwrap_or(keys.cleared.clone()),
            ..keys
        }
    }

    /// Every key a full logout must remove
    pub fn all(&self) -> impl Iterator<Item = &str> {
        [self.token.as_str(), self.user.as_str()]
            .into_iter()
            .chain(self.legacy_token.iter().map(String::as_str))
            .chain(self.legacy_user.iter().map(String::as_str))
            .chain(self.cleared.iter().map(String::as_str))
    }
}

/// Refresh token and role mirror written by older clients
pub fn default_cleared_keys(namespace: &str) -> Vec<String> {
    vec![
        format!("{}:refresh_token", namespace),
        format!("{}:role", namespace),
        "@auth:role".to_string(),
    ]
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}

/// Durable token + user-record storage. Holds no business logic.
pub struct SessionStore<S> {
    backend: S,
    keys: StorageKeys,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(backend: S, keys: StorageKeys) -> Self {
        Self { backend, keys }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Read the stored token
    pub async fn token(&self) -> Result<Option<Token>> {
        self.read_migrating(&self.keys.token, &self.keys.legacy_token, |raw| {
            Ok(Token::from(raw))
        })
        .await
    }

    /// Read and parse the stored user record
    pub async fn user(&self) -> Result<Option<UserRecord>> {
        self.read_migrating(&self.keys.user, &self.keys.legacy_user, |raw| {
            serde_json::from_str(raw).map_err(|e| e.to_string())
        })
        .await
    }

    pub async fn save_token(&self, token: &Token) -> Result<()> {
        self.backend.set(&self.keys.token, token.as_str()).await
    }

    pub async fn save_user(&self, user: &UserRecord) -> Result<()> {
        let raw = serde_json::to_string(user)?;
        self.backend.set(&self.keys.user, &raw).await
    }

    /// Remove the current and all legacy session keys
    pub async fn clear(&self) -> Result<()> {
        for key in self.keys.all() {
            self.backend.remove(key).await?;
        }
        tracing::debug!("Cleared session keys");
        Ok(())
    }

    /// Read and parse `primary`, falling back to `legacy` keys in order.
    ///
    /// A legacy value is only migrated once it parses: it is copied to
    /// `primary` and the legacy key dropped. A legacy value that fails to parse
    /// is left where it is. Migration write failures are logged; the parsed
    /// value is still returned.
    async fn read_migrating<T, F>(&self, primary: &str, legacy: &[String], parse: F) -> Result<Option<T>>
    where
        F: Fn(&str) -> std::result::Result<T, String> + Send + Sync,
        T: Send,
    {
        let parse_at = |key: &str, raw: &str| {
            parse(raw).map_err(|reason| Error::StoreRead {
                key: key.to_string(),
                reason: format!("malformed value: {}", reason),
            })
        };

        if let Some(raw) = self.backend.get(primary).await? {
            if !raw.is_empty() {
                return parse_at(primary, &raw).map(Some);
            }
        }

        for old_key in legacy {
            let Some(raw) = self.backend.get(old_key).await? else {
                continue;
            };
            if raw.is_empty() {
                continue;
            }

            let value = match parse_at(old_key, &raw) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!("Not migrating '{}': {}", old_key, e);
                    return Err(e);
                }
            };

            tracing::info!("Migrating '{}' to '{}'", old_key, primary);
            if let Err(e) = self.backend.set(primary, &raw).await {
                tracing::warn!("Failed to migrate '{}': {}", old_key, e);
            } else if let Err(e) = self.backend.remove(old_key).await {
                tracing::warn!("Failed to remove legacy key '{}': {}", old_key, e);
            }
            return Ok(Some(value));
        }

        Ok(None)
    }
}
