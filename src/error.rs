//! Error types for sessiongate

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read '{key}' from store: {reason}")]
    StoreRead { key: String, reason: String },

    #[error("Failed to write '{key}' to store: {reason}")]
    StoreWrite { key: String, reason: String },

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Config file not found. Run 'sessiongate init' first.")]
    ConfigNotFound,
}

impl Error {
    /// Whether this error came from a failed store write or removal
    pub fn is_write_failure(&self) -> bool {
        matches!(self, Error::StoreWrite { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
