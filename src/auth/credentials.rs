//! Credential verification and issuance
//!
//! Token signing lives outside the drive. The host plugs in a
//! [`CredentialVerifier`] that turns the raw `token` cookie into a role and,
//! if it supports login, a [`TokenIssuer`] that mints one.

use log::debug;
use std::time::Duration;

use crate::auth::role::Role;
use crate::error::AuthError;

/// Turns a raw credential into a role; `None` for anything not valid.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, raw_token: &str) -> Option<Role>;
}

/// Mints a credential for a successfully authenticated user.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, role: Role, username: &str, ttl: Duration) -> Result<String, AuthError>;
}

/// Derives the request role, degrading to guest on a missing, invalid or
/// expired credential.
pub fn role_from_credential(verifier: &dyn CredentialVerifier, raw_token: Option<&str>) -> Role {
    match raw_token.map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => match verifier.verify(token) {
            Some(role) => role,
            None => {
                debug!("Credential rejected, continuing as guest");
                Role::Guest
            }
        },
        None => Role::Guest,
    }
}

/// A single pre-shared admin token.
///
/// Issues and accepts one fixed value. Suitable for tests and for hosts that
/// manage the token themselves; it carries no expiry of its own.
#[derive(Debug, Clone)]
pub struct StaticTokenAuthority {
    admin_token: String,
}

impl StaticTokenAuthority {
    pub fn new(admin_token: impl Into<String>) -> Self {
        Self {
            admin_token: admin_token.into(),
        }
    }
}

impl CredentialVerifier for StaticTokenAuthority {
    fn verify(&self, raw_token: &str) -> Option<Role> {
        if !self.admin_token.is_empty() && raw_token == self.admin_token {
            Some(Role::Admin)
        } else {
            None
        }
    }
}

impl TokenIssuer for StaticTokenAuthority {
    fn issue(&self, role: Role, _username: &str, _ttl: Duration) -> Result<String, AuthError> {
        match role {
            Role::Admin if !self.admin_token.is_empty() => Ok(self.admin_token.clone()),
            Role::Admin => Err(AuthError::IssueFailed("no admin token configured".into())),
            Role::Guest => Err(AuthError::IssueFailed("guests do not need a token".into())),
        }
    }
}
