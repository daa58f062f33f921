//! Configuration schema definitions

use crate::auth::RoleTag;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub routes: RoutesConfig,

    #[serde(default)]
    pub roles: RoleTable,
}

/// Where and under which keys the session is persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON document backing the file store
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Prefix for every session key, e.g. `@esculapi:token`
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Older token keys, read once and migrated to the current key
    #[serde(default = "default_legacy_token_keys")]
    pub legacy_token_keys: Vec<String>,

    /// Older user-record keys, read once and migrated to the current key
    #[serde(default = "default_legacy_user_keys")]
    pub legacy_user_keys: Vec<String>,

    /// Extra keys removed on logout. Unset means `<namespace>:refresh_token`,
    /// `<namespace>:role` and `@auth:role`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleared_keys: Option<Vec<String>>,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./.sessiongate/session.json")
}

fn default_namespace() -> String {
    "@esculapi".to_string()
}

fn default_legacy_token_keys() -> Vec<String> {
    vec!["@esculapi:access_token".to_string(), "@auth:token".to_string()]
}

fn default_legacy_user_keys() -> Vec<String> {
    vec!["@esculapi:user_data".to_string(), "@auth:usuario".to_string()]
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            namespace: default_namespace(),
            legacy_token_keys: default_legacy_token_keys(),
            legacy_user_keys: default_legacy_user_keys(),
            cleared_keys: None,
        }
    }
}

/// Redirect targets produced by the route guard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesConfig {
    #[serde(default = "default_login_route")]
    pub login: String,

    #[serde(default = "default_home_route")]
    pub home: String,
}

fn default_login_route() -> String {
    "/login".to_string()
}

fn default_home_route() -> String {
    "/".to_string()
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            login: default_login_route(),
            home: default_home_route(),
        }
    }
}

/// Backend role tags grouped by the category they classify to.
///
/// Matching is exact-string, so these must mirror what the backend emits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleTable {
    #[serde(default = "default_customer_tags")]
    pub customer: Vec<String>,

    #[serde(default = "default_pharmacy_operator_tags")]
    pub pharmacy_operator: Vec<String>,

    #[serde(default = "default_system_admin_tags")]
    pub system_admin: Vec<String>,
}

fn tags(roles: &[RoleTag]) -> Vec<String> {
    roles.iter().map(|role| role.as_str().to_string()).collect()
}

fn default_customer_tags() -> Vec<String> {
    tags(&[RoleTag::Customer])
}

fn default_pharmacy_operator_tags() -> Vec<String> {
    tags(&[RoleTag::PharmacyAdmin, RoleTag::Pharmacist])
}

fn default_system_admin_tags() -> Vec<String> {
    tags(&[RoleTag::SystemAdmin])
}

impl Default for RoleTable {
    fn default() -> Self {
        Self {
            customer: default_customer_tags(),
            pharmacy_operator: default_pharmacy_operator_tags(),
            system_admin: default_system_admin_tags(),
        }
    }
}

impl Config {
    /// Validate settings that serde defaults cannot guard
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::Error;

        if self.store.namespace.trim().is_empty() {
            return Err(Error::Config("store.namespace must not be empty".to_string()));
        }
        if !self.routes.login.starts_with('/') || !self.routes.home.starts_with('/') {
            return Err(Error::Config(
                "routes.login and routes.home must be absolute paths".to_string(),
            ));
        }
        Ok(())
    }
}
