//! Configuration loading and environment variable interpolation

use crate::error::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;

pub const CONFIG_FILENAME: &str = "sessiongate.toml";

/// Load configuration from sessiongate.toml
pub fn load_config() -> Result<Config> {
    let config_path = find_config_file()?;
    load_config_from_path(&config_path)
}

/// Load configuration, falling back to defaults when no file exists
pub fn load_config_or_default() -> Result<Config> {
    match load_config() {
        Ok(config) => Ok(config),
        Err(Error::ConfigNotFound) => {
            tracing::debug!("No {} found, using defaults", CONFIG_FILENAME);
            Ok(Config::default())
        }
        Err(e) => Err(e),
    }
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(Error::ConfigNotFound),
        Err(e) => return Err(Error::Config(format!("{}: {}", path.display(), e))),
    };
    let content = interpolate_env_vars(&content);
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Find the configuration file, searching upward from current directory
fn find_config_file() -> Result<PathBuf> {
    let mut current = env::current_dir().map_err(|e| Error::Config(e.to_string()))?;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(Error::ConfigNotFound);
        }
    }
}

/// Interpolate environment variables in the format ${VAR_NAME} or ${VAR_NAME:-default}
fn interpolate_env_vars(content: &str) -> String {
    // Compile-time constant pattern; a failure here is a bug, not a runtime condition
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("Invalid regex pattern - this is a bug in the codebase");

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        env::var(var_name).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

/// Generate a default configuration file content
pub fn default_config_content() -> &'static str {
    r#"# sessiongate configuration

[store]
path = "${SESSIONGATE_STORE:-./.sessiongate/session.json}"
namespace = "@esculapi"
# Keys written by older clients; read once and migrated
legacy_token_keys = ["@esculapi:access_token", "@auth:token"]
legacy_user_keys = ["@esculapi:user_data", "@auth:usuario"]
# Removed on logout alongside the keys above
cleared_keys = ["@esculapi:refresh_token", "@esculapi:role", "@auth:role"]

[routes]
login = "/login"
home = "/"

# Backend role tags, matched exactly
[roles]
customer = ["customer"]
pharmacy_operator = ["pharmacy-admin", "pharmacist"]
system_admin = ["system-admin"]
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_interpolation() {
        env::set_var("SESSIONGATE_TEST_VAR", "hello");
        let content = "value = \"${SESSIONGATE_TEST_VAR}\"";
        let result = interpolate_env_vars(content);
        assert_eq!(result, "value = \"hello\"");
        env::remove_var("SESSIONGATE_TEST_VAR");
    }

    #[test]
    fn test_env_interpolation_with_default() {
        let content = "value = \"${NONEXISTENT_VAR:-default_value}\"";
        let result = interpolate_env_vars(content);
        assert_eq!(result, "value = \"default_value\"");
    }

    #[test]
    fn test_default_content_parses() {
        let content = interpolate_env_vars(default_config_content());
        let config: Config = toml::from_str(&content).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.routes.login, "/login");
        assert_eq!(
            crate::storage::StorageKeys::from_config(&config.store),
            crate::storage::StorageKeys::default()
        );
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "[routes]\nhome = \"/inicio\"\n").unwrap();

        let config = load_config_from_path(&path).unwrap();
        assert_eq!(config.routes.home, "/inicio");
        assert_eq!(config.routes.login, "/login");
    }

    #[test]
    fn test_load_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config_from_path(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(Error::ConfigNotFound)));
    }

    #[test]
    fn test_load_unreadable_path_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::create_dir(&path).unwrap();

        let result = load_config_from_path(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
