//! Declarative YAML test specification
//!
//! A spec that declares a `role` runs in a browsing context restored
//! from that role's persisted session; a spec without one starts
//! unauthenticated (the login scenarios themselves).

use serde::{Deserialize, Serialize};
use std::path::Path;

use couponly_session::Role;

use crate::error::{E2eError, E2eResult};

/// A complete test specification parsed from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    /// Unique name for this test.
    pub name: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// Role whose persisted session this test group starts from.
    #[serde(default)]
    pub role: Option<Role>,

    /// Tags for filtering tests.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Viewport size for the browser.
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    /// Steps to execute in order.
    pub steps: Vec<TestStep>,
}

fn default_viewport() -> Viewport {
    Viewport {
        width: 1280,
        height: 720,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// A single step in a test.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a path (relative to base URL).
    Navigate { path: String },

    /// Click an element.
    Click {
        selector: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Fill an input field.
    Fill { selector: String, value: String },

    /// Wait until the location path matches a regular expression.
    ExpectPath {
        pattern: String,
        #[serde(default = "default_path_timeout")]
        timeout_ms: u64,
    },

    /// Wait for an element to become visible.
    ExpectVisible {
        selector: String,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
    },

    /// Wait for text to become visible anywhere on the page.
    /// Case-insensitive unless `match_case` is set.
    ExpectText {
        text: String,
        #[serde(default)]
        match_case: bool,
        #[serde(default = "default_text_timeout")]
        timeout_ms: u64,
    },

    /// Wait for a fixed amount of time (use sparingly).
    Sleep { ms: u64 },
}

fn default_path_timeout() -> u64 {
    5_000
}

fn default_wait_timeout() -> u64 {
    5_000
}

fn default_text_timeout() -> u64 {
    // Error banners render after the failed login round trip.
    10_000
}

impl TestStep {
    /// Short human-readable label used in step reporting.
    pub fn label(&self) -> String {
        match self {
            TestStep::Navigate { path } => format!("navigate:{path}"),
            TestStep::Click { selector, .. } => format!("click:{selector}"),
            TestStep::Fill { selector, .. } => format!("fill:{selector}"),
            TestStep::ExpectPath { pattern, .. } => format!("expect_path:{pattern}"),
            TestStep::ExpectVisible { selector, .. } => format!("expect_visible:{selector}"),
            TestStep::ExpectText { text, .. } => format!("expect_text:{text}"),
            TestStep::Sleep { ms } => format!("sleep:{ms}ms"),
        }
    }
}

impl TestSpec {
    /// Parse a test spec from a YAML string.
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(E2eError::from)
    }

    /// Parse a test spec from a YAML file.
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| {
            E2eError::SpecParse(format!("{}: {e}", path.display()))
        })
    }

    /// Load all test specs from a directory, sorted by name so the run
    /// order is stable across filesystems.
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            specs.push(Self::from_file(entry.path())?);
        }

        Ok(specs)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unauthenticated_login_spec() {
        let yaml = r#"
name: login-invalid-credentials
description: Wrong password keeps the user on /login with an error
tags:
  - auth
  - smoke
steps:
  - action: navigate
    path: /login
  - action: click
    selector: '[data-testid="role-customer"]'
  - action: fill
    selector: '[data-testid="login-email"]'
    value: wrong@example.com
  - action: fill
    selector: '[data-testid="login-password"]'
    value: wrongpassword
  - action: click
    selector: '[data-testid="login-submit"]'
  - action: expect_text
    text: invalid credentials
  - action: expect_path
    pattern: '^/login$'
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.name, "login-invalid-credentials");
        assert!(spec.role.is_none());
        assert!(spec.has_tag("auth"));
        assert_eq!(spec.steps.len(), 7);

        match &spec.steps[5] {
            TestStep::ExpectText {
                text,
                match_case,
                timeout_ms,
            } => {
                assert_eq!(text, "invalid credentials");
                assert!(!match_case, "text match defaults to case-insensitive");
                assert_eq!(*timeout_ms, 10_000);
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn parses_role_bound_spec() {
        let yaml = r#"
name: customer-coupon-list
role: customer
tags: [coupons]
viewport:
  width: 1920
  height: 1080
steps:
  - action: navigate
    path: /customer/coupons
  - action: expect_visible
    selector: '[data-testid="coupon-list"]'
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.role, Some(Role::Customer));
        assert_eq!(spec.viewport.width, 1920);
    }

    #[test]
    fn step_labels_are_compact() {
        let step = TestStep::ExpectPath {
            pattern: "^/customer".into(),
            timeout_ms: 5_000,
        };
        assert_eq!(step.label(), "expect_path:^/customer");
    }

    #[test]
    fn rejects_unknown_role() {
        let yaml = r#"
name: bad
role: superuser
steps: []
"#;
        assert!(TestSpec::from_yaml(yaml).is_err());
    }
}
