//! Authentication and authorization
//!
//! Roles, the credential verification seam and admin login validation.

pub mod credentials;
pub mod role;
pub mod validator;

pub use credentials::{CredentialVerifier, StaticTokenAuthority, TokenIssuer, role_from_credential};
pub use role::{Role, require_admin};
pub use validator::validate_login;
