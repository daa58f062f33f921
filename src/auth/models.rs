//! Session models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque auth token issued by the backend.
///
/// Presence means "previously authenticated"; there is no expiry or refresh.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// User profile as persisted alongside the token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Raw backend role tag, kept verbatim so unknown tags survive a round trip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl UserRecord {
    pub fn new(id: i64, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            name: None,
            role: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Merge the populated fields of `update` into this record
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(name) = &update.name {
            self.name = Some(name.clone());
        }
        if let Some(email) = &update.email {
            self.email = email.clone();
        }
    }
}

/// Partial profile edit; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ProfileUpdate {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// A token paired with the identity it was issued for.
///
/// The two halves only exist together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: Token,
    user: UserRecord,
}

impl Session {
    pub fn new(token: Token, user: UserRecord) -> Self {
        Self { token, user }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn user(&self) -> &UserRecord {
        &self.user
    }

    pub(crate) fn user_mut(&mut self) -> &mut UserRecord {
        &mut self.user
    }
}

/// Role tags the backend is known to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleTag {
    Customer,
    PharmacyAdmin,
    Pharmacist,
    SystemAdmin,
}

impl RoleTag {
    pub const ALL: [RoleTag; 4] = [
        RoleTag::Customer,
        RoleTag::PharmacyAdmin,
        RoleTag::Pharmacist,
        RoleTag::SystemAdmin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleTag::Customer => "customer",
            RoleTag::PharmacyAdmin => "pharmacy-admin",
            RoleTag::Pharmacist => "pharmacist",
            RoleTag::SystemAdmin => "system-admin",
        }
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse permission tier derived from a role tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleCategory {
    Customer,
    PharmacyOperator,
    None,
}

impl fmt::Display for RoleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleCategory::Customer => write!(f, "customer"),
            RoleCategory::PharmacyOperator => write!(f, "pharmacy-operator"),
            RoleCategory::None => write!(f, "none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_debug_is_redacted() {
        let token = Token::new("secret-value");
        assert!(!format!("{:?}", token).contains("secret-value"));
    }

    #[test]
    fn test_empty_object_deserializes() {
        let user: UserRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(user, UserRecord::default());
        assert!(user.role.is_none());
    }

    #[test]
    fn test_apply_merges_only_populated_fields() {
        let mut user = UserRecord::new(7, "ana@example.com")
            .with_name("Ana")
            .with_role("customer");
        user.apply(&ProfileUpdate::name("Ana Paula"));

        assert_eq!(user.name.as_deref(), Some("Ana Paula"));
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.role.as_deref(), Some("customer"));
    }

    #[test]
    fn test_role_tag_strings() {
        assert_eq!(RoleTag::Pharmacist.as_str(), "pharmacist");
        assert_eq!(RoleTag::SystemAdmin.to_string(), "system-admin");
        let distinct: std::collections::HashSet<_> =
            RoleTag::ALL.iter().map(|tag| tag.as_str()).collect();
        assert_eq!(distinct.len(), RoleTag::ALL.len());
    }
}
