//! Role classification

use crate::auth::models::{RoleCategory, UserRecord};
use crate::config::RoleTable;
use std::sync::OnceLock;

/// Maps raw backend role tags onto [`RoleCategory`].
///
/// Total over its input: absent records, absent roles and unknown tags all
/// classify to [`RoleCategory::None`].
#[derive(Debug, Clone, Default)]
pub struct RoleClassifier {
    table: RoleTable,
}

impl RoleClassifier {
    pub fn new(table: RoleTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RoleTable {
        &self.table
    }

    pub fn classify(&self, user: Option<&UserRecord>) -> RoleCategory {
        let Some(tag) = role_tag(user) else {
            return RoleCategory::None;
        };

        if contains(&self.table.pharmacy_operator, tag) {
            RoleCategory::PharmacyOperator
        } else if contains(&self.table.customer, tag) {
            RoleCategory::Customer
        } else {
            RoleCategory::None
        }
    }

    pub fn can_manage_pharmacy(&self, user: Option<&UserRecord>) -> bool {
        self.classify(user) == RoleCategory::PharmacyOperator
    }

    pub fn is_customer(&self, user: Option<&UserRecord>) -> bool {
        self.classify(user) == RoleCategory::Customer
    }

    /// System admins classify to `None`; this checks the raw tag
    pub fn is_system_admin(&self, user: Option<&UserRecord>) -> bool {
        role_tag(user).is_some_and(|tag| contains(&self.table.system_admin, tag))
    }
}

fn role_tag(user: Option<&UserRecord>) -> Option<&str> {
    user.and_then(|u| u.role.as_deref())
}

fn contains(tags: &[String], tag: &str) -> bool {
    tags.iter().any(|t| t == tag)
}

fn default_classifier() -> &'static RoleClassifier {
    static CLASSIFIER: OnceLock<RoleClassifier> = OnceLock::new();
    CLASSIFIER.get_or_init(RoleClassifier::default)
}

/// Classify using the default tag table
pub fn classify(user: Option<&UserRecord>) -> RoleCategory {
    default_classifier().classify(user)
}

/// Whether the user may manage a pharmacy, using the default tag table
pub fn can_manage_pharmacy(user: Option<&UserRecord>) -> bool {
    default_classifier().can_manage_pharmacy(user)
}

pub fn is_system_admin(user: Option<&UserRecord>) -> bool {
    default_classifier().is_system_admin(user)
}
