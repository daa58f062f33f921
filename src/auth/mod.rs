//! Session state, role classification and route gating

pub mod guard;
pub mod models;
pub mod role;
pub mod session;

pub use guard::{evaluate, Decision, RequiredLevel, RouteGuard};
pub use models::{ProfileUpdate, RoleCategory, RoleTag, Session, Token, UserRecord};
pub use role::{can_manage_pharmacy, classify, is_system_admin, RoleClassifier};
pub use session::{SessionResolver, SessionState, SessionStatus};
