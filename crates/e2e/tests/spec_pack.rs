//! The shipped spec pack must stay loadable and internally consistent

use std::path::PathBuf;

use couponly_e2e::{TestSpec, TestStep};
use couponly_session::Role;

fn specs_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("specs")
}

#[test]
fn all_shipped_specs_parse() {
    let specs = TestSpec::load_all(&specs_dir()).unwrap();
    assert!(specs.len() >= 6, "spec pack went missing");

    let mut names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
    names.sort_unstable();
    let unique = names.len();
    names.dedup();
    assert_eq!(names.len(), unique, "spec names must be unique");
}

#[test]
fn login_scenarios_run_unauthenticated() {
    let specs = TestSpec::load_all(&specs_dir()).unwrap();
    for spec in specs.iter().filter(|s| s.has_tag("auth")) {
        assert!(
            spec.role.is_none(),
            "{} exercises the login form and must not bind a session",
            spec.name
        );
    }
}

#[test]
fn every_role_has_a_bound_test_group() {
    let specs = TestSpec::load_all(&specs_dir()).unwrap();
    for role in Role::ALL {
        assert!(
            specs.iter().any(|s| s.role == Some(role)),
            "no test group bound to role '{role}'"
        );
    }
}

#[test]
fn valid_login_spec_uses_seed_customer_account() {
    let specs = TestSpec::load_all(&specs_dir()).unwrap();
    let spec = specs
        .iter()
        .find(|s| s.name == "login-valid-customer")
        .unwrap();

    let filled: Vec<&str> = spec
        .steps
        .iter()
        .filter_map(|s| match s {
            TestStep::Fill { value, .. } => Some(value.as_str()),
            _ => None,
        })
        .collect();
    assert!(filled.contains(&"john.smith@email.com"));
    assert!(filled.contains(&"password123"));

    // The success signal is the redirect to the customer area.
    assert!(spec.steps.iter().any(|s| matches!(
        s,
        TestStep::ExpectPath { pattern, .. } if pattern.starts_with("^/customer")
    )));
}

#[test]
fn invalid_login_spec_stays_on_login() {
    let specs = TestSpec::load_all(&specs_dir()).unwrap();
    let spec = specs
        .iter()
        .find(|s| s.name == "login-invalid-credentials")
        .unwrap();

    let last = spec.steps.last().unwrap();
    assert!(matches!(
        last,
        TestStep::ExpectPath { pattern, .. } if pattern == "^/login$"
    ));

    // The error banner must be discoverable case-insensitively and
    // within its declared bound.
    assert!(spec.steps.iter().any(|s| matches!(
        s,
        TestStep::ExpectText { match_case: false, timeout_ms, .. } if *timeout_ms <= 10_000
    )));
}
