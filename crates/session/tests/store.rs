//! Session store behavior against a real (temporary) filesystem

use couponly_session::snapshot::{Cookie, OriginState, SessionSnapshot, StorageEntry};
use couponly_session::{FixtureBinder, FixtureError, Role, SessionStore};

fn sample_snapshot(role: Role) -> SessionSnapshot {
    SessionSnapshot {
        cookies: vec![Cookie {
            name: "couponly_session".into(),
            value: format!("token-for-{role}"),
            domain: "localhost".into(),
            path: "/".into(),
            http_only: true,
            ..Default::default()
        }],
        origins: vec![OriginState {
            origin: "http://localhost:4173".into(),
            local_storage: vec![StorageEntry {
                name: "active_role".into(),
                value: role.as_str().into(),
            }],
        }],
        ..Default::default()
    }
}

#[test]
fn save_then_load_round_trips() {
    let tmp = tempfile::tempdir().unwrap();
    let store = SessionStore::new(tmp.path());

    let snapshot = sample_snapshot(Role::Customer);
    let path = store.save(Role::Customer, &snapshot).unwrap();
    assert_eq!(path, tmp.path().join("customer.json"));

    let loaded = store.load(Role::Customer).unwrap();
    assert_eq!(loaded, snapshot);
}

#[test]
fn save_overwrites_prior_snapshot() {
    let tmp = tempfile::tempdir().unwrap();
    let store = SessionStore::new(tmp.path());

    let first = sample_snapshot(Role::Admin);
    store.save(Role::Admin, &first).unwrap();

    let mut second = sample_snapshot(Role::Admin);
    second.cookies[0].value = "rotated".into();
    store.save(Role::Admin, &second).unwrap();

    // At most one live snapshot per role: the new write supersedes.
    let loaded = store.load(Role::Admin).unwrap();
    assert_eq!(loaded.cookies[0].value, "rotated");
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
}

#[test]
fn load_before_save_reports_session_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let store = SessionStore::new(tmp.path());

    let err = store.load(Role::Company).unwrap_err();
    assert!(matches!(
        err,
        FixtureError::SessionNotFound { role: Role::Company, .. }
    ));
}

#[test]
fn clear_removes_every_file_and_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let store = SessionStore::new(tmp.path());

    for role in Role::ALL {
        store.save(role, &sample_snapshot(role)).unwrap();
    }

    assert_eq!(store.clear().unwrap(), 3);
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);

    // Second call finds nothing to do and is not an error.
    assert_eq!(store.clear().unwrap(), 0);
}

#[test]
fn clear_on_missing_directory_is_a_noop() {
    let tmp = tempfile::tempdir().unwrap();
    let store = SessionStore::new(tmp.path().join("never-created"));
    assert_eq!(store.clear().unwrap(), 0);
}

#[test]
fn binder_resolves_persisted_session_read_only() {
    let tmp = tempfile::tempdir().unwrap();
    let store = SessionStore::new(tmp.path());
    store.save(Role::Customer, &sample_snapshot(Role::Customer)).unwrap();

    let binder = FixtureBinder::new(store.clone());
    let bound = binder.bind(Role::Customer).unwrap();
    assert_eq!(bound.role, Role::Customer);
    assert_eq!(bound.path, store.path_for(Role::Customer));
    assert_eq!(bound.snapshot.origins[0].local_storage[0].value, "customer");

    // Binding twice reads the same state and mutates nothing.
    let again = binder.bind(Role::Customer).unwrap();
    assert_eq!(again.snapshot, bound.snapshot);
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
}

#[test]
fn binder_surfaces_missing_setup() {
    let tmp = tempfile::tempdir().unwrap();
    let binder = FixtureBinder::new(SessionStore::new(tmp.path()));
    assert!(matches!(
        binder.bind(Role::Admin).unwrap_err(),
        FixtureError::SessionNotFound { .. }
    ));
}
