//! User roles of the Couponly application

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three user categories the application supports, each with a
/// distinct post-login landing area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Company,
    Customer,
}

impl Role {
    /// All roles, in the order the setup phase authenticates them.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Company, Role::Customer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Company => "company",
            Role::Customer => "customer",
        }
    }

    /// File name of this role's persisted snapshot inside the store
    /// directory (e.g. `admin.json`).
    pub fn storage_file(&self) -> String {
        format!("{}.json", self.as_str())
    }

    /// Path prefix the application redirects to after a successful
    /// login as this role.
    pub fn landing_path(&self) -> String {
        format!("/{}", self.as_str())
    }

    /// Whether a browser location counts as this role's landing area.
    ///
    /// Matches `/admin` and `/admin/...` but not `/administration`.
    pub fn is_landing(&self, path: &str) -> bool {
        let landing = self.landing_path();
        path == landing || path.strip_prefix(&landing).is_some_and(|rest| rest.starts_with('/'))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "company" => Ok(Role::Company),
            "customer" => Ok(Role::Customer),
            other => Err(format!("unknown role: {other}")),
        }
    }
}
