//! CLI command implementations

use anyhow::Result;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::auth::{
    Decision, ProfileUpdate, RequiredLevel, RoleCategory, RouteGuard, SessionResolver,
    SessionStatus, Token, UserRecord,
};
use crate::cli::{error, info, print_decision_table, print_session, success, warn, OutputFormat};
use crate::config::{self, Config};
use crate::storage::{FileStore, SessionStore, StorageKeys};

/// Initialize a new sessiongate.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = Path::new(config::loader::CONFIG_FILENAME);

    if config_path.exists() {
        warn("sessiongate.toml already exists");
        return Ok(());
    }

    let content = config::loader::default_config_content();
    fs::write(config_path, content)?;

    success("Created sessiongate.toml");
    info("Edit the role tags to match your backend, then run 'sessiongate status'");

    Ok(())
}

#[derive(Serialize)]
struct SessionSummary<'a> {
    status: SessionStatus,
    authenticated: bool,
    category: RoleCategory,
    user: Option<&'a UserRecord>,
}

/// Show the stored session
pub async fn status(format: OutputFormat) -> Result<()> {
    let config = load_config()?;
    let guard = RouteGuard::from_config(&config);
    let state = open_resolver(&config).load().await;
    let category = guard.classifier().classify(state.user());

    match format {
        OutputFormat::Table => print_session(&state, category),
        OutputFormat::Json => {
            let summary = SessionSummary {
                status: state.status(),
                authenticated: state.is_authenticated(),
                category,
                user: state.user(),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

/// Replace the stored session
pub async fn login(
    token: String,
    id: i64,
    email: String,
    name: Option<String>,
    role: Option<String>,
) -> Result<()> {
    let config = load_config()?;
    let resolver = open_resolver(&config);

    let user = UserRecord {
        id,
        email,
        name,
        role,
    };

    match resolver.login(Token::new(token), user).await {
        Ok(()) => {
            let category = RouteGuard::from_config(&config)
                .classifier()
                .classify(resolver.state().user());
            success(&format!("Logged in as {}", category));
            Ok(())
        }
        Err(e) => {
            error(&format!("Failed to log in: {}", e));
            Err(e.into())
        }
    }
}

/// Clear the stored session
pub async fn logout() -> Result<()> {
    let config = load_config()?;
    let resolver = open_resolver(&config);

    match resolver.logout().await {
        Ok(()) => {
            success("Logged out");
            Ok(())
        }
        Err(e) => {
            error(&format!("Failed to log out: {}", e));
            Err(e.into())
        }
    }
}

/// Edit profile fields of the stored user
pub async fn update_profile(name: Option<String>, email: Option<String>) -> Result<()> {
    let update = ProfileUpdate { name, email };
    if update.is_empty() {
        warn("Nothing to update. Pass --name or --email");
        return Ok(());
    }

    let config = load_config()?;
    let resolver = open_resolver(&config);
    resolver.load().await;

    match resolver.update_profile(update).await? {
        Some(user) => success(&format!("Updated profile for {}", user.email)),
        None => warn("No session stored, nothing updated"),
    }

    Ok(())
}

/// Evaluate the route guard against the stored session
pub async fn check(level: Option<RequiredLevel>) -> Result<()> {
    let config = load_config()?;
    let guard = RouteGuard::from_config(&config);
    let state = open_resolver(&config).load().await;

    let levels = match level {
        Some(level) => vec![level],
        None => RequiredLevel::ALL.to_vec(),
    };
    let decisions: Vec<(RequiredLevel, Decision)> = levels
        .into_iter()
        .map(|level| (level, guard.evaluate(&state, level)))
        .collect();

    print_decision_table(&decisions);
    Ok(())
}

fn load_config() -> Result<Config> {
    Ok(config::load_config_or_default()?)
}

fn open_resolver(config: &Config) -> SessionResolver<FileStore> {
    let store = SessionStore::new(
        FileStore::new(&config.store.path),
        StorageKeys::from_config(&config.store),
    );
    SessionResolver::new(store)
}
