//! Static role-to-credential mapping

use std::collections::HashMap;

use crate::error::{FixtureError, FixtureResult};
use crate::role::Role;

/// Login credentials for one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub role: Role,
    pub email: String,
    pub password: String,
}

/// Registry of credentials, one per role, built once at startup and
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct CredentialRegistry {
    entries: HashMap<Role, Credential>,
}

impl CredentialRegistry {
    /// Build a registry from an explicit credential list. Later entries
    /// for the same role win.
    pub fn new(credentials: impl IntoIterator<Item = Credential>) -> Self {
        let entries = credentials.into_iter().map(|c| (c.role, c)).collect();
        Self { entries }
    }

    /// The built-in seed accounts of the staging deployment, with
    /// per-role environment overrides (`COUPONLY_ADMIN_EMAIL`,
    /// `COUPONLY_ADMIN_PASSWORD`, and so on for the other roles).
    pub fn from_env() -> Self {
        let defaults = [
            (Role::Admin, "admin@couponly.test", "admin123"),
            (Role::Company, "office@pizza-planet.com", "company123"),
            (Role::Customer, "john.smith@email.com", "password123"),
        ];

        Self::new(defaults.into_iter().map(|(role, email, password)| {
            let upper = role.as_str().to_uppercase();
            Credential {
                role,
                email: std::env::var(format!("COUPONLY_{upper}_EMAIL"))
                    .unwrap_or_else(|_| email.to_string()),
                password: std::env::var(format!("COUPONLY_{upper}_PASSWORD"))
                    .unwrap_or_else(|_| password.to_string()),
            }
        }))
    }

    pub fn lookup(&self, role: Role) -> FixtureResult<&Credential> {
        self.entries
            .get(&role)
            .ok_or(FixtureError::MissingCredential { role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_covers_every_role() {
        let registry = CredentialRegistry::from_env();
        for role in Role::ALL {
            let cred = registry.lookup(role).unwrap();
            assert_eq!(cred.role, role);
            assert!(cred.email.contains('@'));
        }
    }

    #[test]
    fn lookup_fails_for_unregistered_role() {
        let registry = CredentialRegistry::new([Credential {
            role: Role::Admin,
            email: "admin@couponly.test".into(),
            password: "admin123".into(),
        }]);

        assert!(registry.lookup(Role::Admin).is_ok());
        let err = registry.lookup(Role::Customer).unwrap_err();
        assert!(matches!(
            err,
            FixtureError::MissingCredential { role: Role::Customer }
        ));
    }
}
