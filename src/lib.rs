//! sessiongate - persisted client sessions and route gating
//!
//! Loads an auth token and user record from a key-value store, classifies the
//! user's backend role and decides whether a screen may render, must redirect,
//! or has to wait for the session to finish loading.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod storage;

pub use auth::{Decision, RequiredLevel, RouteGuard, SessionResolver, SessionState};
pub use config::Config;
pub use error::Error;
pub use storage::{FileStore, KeyValueStore, MemoryStore, SessionStore, StorageKeys};
