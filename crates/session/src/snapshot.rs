//! Serialized browsing-context state
//!
//! The on-disk format is the browser automation layer's storage-state
//! JSON: a cookie list plus per-origin localStorage entries. Fields we
//! do not model are preserved through a load/save round trip so the
//! files stay usable by the automation layer itself.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Authenticated browsing-context state for exactly one role.
///
/// Created by the authenticator after a successful login, written once
/// to the session store, read many times by the fixture binder, never
/// mutated after creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub cookies: Vec<Cookie>,

    #[serde(default)]
    pub origins: Vec<OriginState>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub same_site: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// localStorage entries for one origin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginState {
    pub origin: String,
    #[serde(default)]
    pub local_storage: Vec<StorageEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageEntry {
    pub name: String,
    pub value: String,
}

impl SessionSnapshot {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// A snapshot with no cookies and no storage carries no session.
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty() && self.origins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORAGE_STATE: &str = r#"{
        "cookies": [
            {
                "name": "couponly_session",
                "value": "abc123",
                "domain": "localhost",
                "path": "/",
                "expires": 1893456000.5,
                "httpOnly": true,
                "secure": false,
                "sameSite": "Lax"
            }
        ],
        "origins": [
            {
                "origin": "http://localhost:4173",
                "localStorage": [
                    { "name": "auth_token", "value": "jwt-goes-here" },
                    { "name": "active_role", "value": "customer" }
                ]
            }
        ]
    }"#;

    #[test]
    fn parses_storage_state_json() {
        let snapshot = SessionSnapshot::from_json(STORAGE_STATE).unwrap();
        assert_eq!(snapshot.cookies.len(), 1);
        assert_eq!(snapshot.cookies[0].name, "couponly_session");
        assert!(snapshot.cookies[0].http_only);
        assert_eq!(snapshot.origins[0].local_storage.len(), 2);
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn round_trip_preserves_unknown_fields() {
        let with_unknown = r#"{
            "cookies": [],
            "origins": [],
            "futureField": { "nested": true }
        }"#;
        let snapshot = SessionSnapshot::from_json(with_unknown).unwrap();
        let json = snapshot.to_json().unwrap();
        assert!(json.contains("futureField"));

        let reparsed = SessionSnapshot::from_json(&json).unwrap();
        assert_eq!(snapshot, reparsed);
    }

    #[test]
    fn empty_snapshot_is_empty() {
        assert!(SessionSnapshot::default().is_empty());
    }
}
