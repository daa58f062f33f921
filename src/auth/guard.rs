//! Route guard decisions

use crate::auth::role::RoleClassifier;
use crate::auth::session::SessionState;
use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tokio::sync::watch;

/// Permission a screen requires before it may render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RequiredLevel {
    None,
    Authenticated,
    Admin,
    PharmacyOperator,
}

impl RequiredLevel {
    pub const ALL: [RequiredLevel; 4] = [
        RequiredLevel::None,
        RequiredLevel::Authenticated,
        RequiredLevel::Admin,
        RequiredLevel::PharmacyOperator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequiredLevel::None => "none",
            RequiredLevel::Authenticated => "authenticated",
            RequiredLevel::Admin => "admin",
            RequiredLevel::PharmacyOperator => "pharmacy-operator",
        }
    }
}

impl fmt::Display for RequiredLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequiredLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequiredLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| format!("unknown required level '{}'", s))
    }
}

/// Outcome of evaluating a session against a [`RequiredLevel`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Session status not known yet; render neither content nor a redirect
    Pending,
    Allow,
    Redirect(String),
}

impl Decision {
    pub fn is_pending(&self) -> bool {
        matches!(self, Decision::Pending)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Pending => write!(f, "pending"),
            Decision::Allow => write!(f, "allow"),
            Decision::Redirect(target) => write!(f, "redirect {}", target),
        }
    }
}

/// Stateless gate over a [`SessionState`].
///
/// Checks run in a fixed order: loading, then authentication, then role.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    login_route: String,
    home_route: String,
    classifier: RoleClassifier,
}

impl RouteGuard {
    pub fn new(
        login_route: impl Into<String>,
        home_route: impl Into<String>,
        classifier: RoleClassifier,
    ) -> Self {
        Self {
            login_route: login_route.into(),
            home_route: home_route.into(),
            classifier,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.routes.login.clone(),
            config.routes.home.clone(),
            RoleClassifier::new(config.roles.clone()),
        )
    }

    pub fn classifier(&self) -> &RoleClassifier {
        &self.classifier
    }

    pub fn evaluate(&self, state: &SessionState, level: RequiredLevel) -> Decision {
        if state.is_loading() {
            return Decision::Pending;
        }

        if level == RequiredLevel::None {
            return Decision::Allow;
        }

        if !state.is_authenticated() {
            return Decision::Redirect(self.login_route.clone());
        }

        let user = state.user();
        let permitted = match level {
            RequiredLevel::None | RequiredLevel::Authenticated => true,
            RequiredLevel::Admin => self.classifier.is_system_admin(user),
            RequiredLevel::PharmacyOperator => self.classifier.can_manage_pharmacy(user),
        };

        if permitted {
            Decision::Allow
        } else {
            tracing::debug!(
                required = %level,
                role = user.and_then(|u| u.role.as_deref()).unwrap_or("-"),
                "Insufficient role"
            );
            Decision::Redirect(self.home_route.clone())
        }
    }

    /// Wait until the session leaves the pending phase and return that decision.
    ///
    /// If the sender is dropped first, the last observed state is evaluated.
    pub async fn settle(
        &self,
        mut rx: watch::Receiver<SessionState>,
        level: RequiredLevel,
    ) -> Decision {
        if rx
            .wait_for(|state| !self.evaluate(state, level).is_pending())
            .await
            .is_err()
        {
            tracing::debug!("Session channel closed before the guard settled");
        }
        let state = rx.borrow().clone();
        self.evaluate(&state, level)
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub(crate) fn default_guard() -> &'static RouteGuard {
    static GUARD: OnceLock<RouteGuard> = OnceLock::new();
    GUARD.get_or_init(RouteGuard::default)
}

/// Evaluate with the default routes (`/login`, `/`) and role table
pub fn evaluate(state: &SessionState, level: RequiredLevel) -> Decision {
    default_guard().evaluate(state, level)
}
