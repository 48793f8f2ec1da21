//! Roles
//!
//! The drive knows two roles: the administrator, who may mutate the tree,
//! and guests, who may only read it.

use serde::Serialize;

use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Guest,
}

impl Role {
    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Guest => "guest",
        }
    }
}

/// Precondition for every mutating operation.
pub fn require_admin(role: Role) -> Result<(), AuthError> {
    if role.is_admin() {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}
