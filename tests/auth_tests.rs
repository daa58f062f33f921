//! Role classification and route guard tests

use sessiongate::auth::{
    can_manage_pharmacy, classify, evaluate, Decision, RequiredLevel, RoleCategory,
    RoleClassifier, RoleTag, RouteGuard, Session, SessionState, Token, UserRecord,
};
use sessiongate::config::{Config, RoleTable};

fn user_with_role(role: &str) -> UserRecord {
    UserRecord::new(10, "someone@example.com").with_role(role)
}

fn signed_in(role: &str) -> SessionState {
    SessionState::authenticated(Session::new(Token::new("token-abc"), user_with_role(role)))
}

#[test]
fn test_classify_every_known_tag() {
    let expected = [
        (RoleTag::Customer, RoleCategory::Customer),
        (RoleTag::PharmacyAdmin, RoleCategory::PharmacyOperator),
        (RoleTag::Pharmacist, RoleCategory::PharmacyOperator),
        (RoleTag::SystemAdmin, RoleCategory::None),
    ];

    for (tag, category) in expected {
        assert_eq!(classify(Some(&user_with_role(tag.as_str()))), category);
    }
}

#[test]
fn test_classify_is_total() {
    let empty: UserRecord = serde_json::from_str("{}").unwrap();

    assert_eq!(classify(None), RoleCategory::None);
    assert_eq!(classify(Some(&empty)), RoleCategory::None);
    for role in ["", "ROLE_CLIENTE", "CUSTOMER", "pharmacy_admin", " customer"] {
        assert_eq!(classify(Some(&user_with_role(role))), RoleCategory::None, "{role:?}");
    }
}

#[test]
fn test_can_manage_pharmacy_absent_user() {
    assert!(!can_manage_pharmacy(None));
}

#[test]
fn test_can_manage_pharmacy_matches_classification() {
    for tag in RoleTag::ALL {
        let user = user_with_role(tag.as_str());
        assert_eq!(
            can_manage_pharmacy(Some(&user)),
            classify(Some(&user)) == RoleCategory::PharmacyOperator
        );
    }
}

#[test]
fn test_loading_session_is_pending_for_every_level() {
    for level in RequiredLevel::ALL {
        assert_eq!(evaluate(&SessionState::loading(), level), Decision::Pending);
    }
}

#[test]
fn test_customer_requiring_pharmacy_operator_goes_home() {
    assert_eq!(
        evaluate(&signed_in("customer"), RequiredLevel::PharmacyOperator),
        Decision::Redirect("/".to_string())
    );
}

#[test]
fn test_unauthenticated_requiring_login_goes_to_login() {
    assert_eq!(
        evaluate(&SessionState::unauthenticated(), RequiredLevel::Authenticated),
        Decision::Redirect("/login".to_string())
    );
}

#[test]
fn test_unknown_role_gets_no_special_access() {
    let state = signed_in("ROLE_SUPERUSER");
    assert_eq!(evaluate(&state, RequiredLevel::Authenticated), Decision::Allow);
    assert_eq!(
        evaluate(&state, RequiredLevel::Admin),
        Decision::Redirect("/".to_string())
    );
    assert_eq!(
        evaluate(&state, RequiredLevel::PharmacyOperator),
        Decision::Redirect("/".to_string())
    );
}

#[test]
fn test_pharmacy_staff_allowed() {
    for role in ["pharmacy-admin", "pharmacist"] {
        assert_eq!(
            evaluate(&signed_in(role), RequiredLevel::PharmacyOperator),
            Decision::Allow
        );
    }
}

#[test]
fn test_guard_uses_configured_role_table() {
    let config: Config = toml::from_str(
        r#"
[roles]
customer = ["ROLE_CLIENTE"]
pharmacy_operator = ["ROLE_LOJISTA_ADMIN", "ROLE_FARMACEUTICO"]
system_admin = ["ROLE_ADMIN"]
"#,
    )
    .unwrap();
    let guard = RouteGuard::from_config(&config);

    assert_eq!(
        guard.evaluate(&signed_in("ROLE_FARMACEUTICO"), RequiredLevel::PharmacyOperator),
        Decision::Allow
    );
    assert_eq!(
        guard.evaluate(&signed_in("ROLE_ADMIN"), RequiredLevel::Admin),
        Decision::Allow
    );
    assert_eq!(
        guard.evaluate(&signed_in("pharmacist"), RequiredLevel::PharmacyOperator),
        Decision::Redirect("/".to_string())
    );
}

#[test]
fn test_classifier_table_accessor() {
    let classifier = RoleClassifier::new(RoleTable::default());
    assert_eq!(classifier.table().pharmacy_operator.len(), 2);
}

#[test]
fn test_decision_display() {
    assert_eq!(Decision::Pending.to_string(), "pending");
    assert_eq!(Decision::Allow.to_string(), "allow");
    assert_eq!(
        Decision::Redirect("/login".to_string()).to_string(),
        "redirect /login"
    );
}
