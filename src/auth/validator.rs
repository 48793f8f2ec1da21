//! Login validation
//!
//! Checks submitted credentials against the single configured administrator.

use crate::config::DriveConfig;
use crate::error::AuthError;

/// Performs basic input sanitation to check for malicious or malformed usernames/passwords.
fn is_valid_input(input: &str, max_length: usize) -> bool {
    !input.trim().is_empty() && input.len() <= max_length && !input.contains(['\r', '\n', '\0'])
}

/// Validates a login attempt for the administrator account.
pub fn validate_login(
    username: &str,
    password: &str,
    config: &DriveConfig,
) -> Result<(), AuthError> {
    if !is_valid_input(username, config.max_credential_length) {
        return Err(AuthError::MalformedInput("Invalid username format".into()));
    }

    if !is_valid_input(password, config.max_credential_length) {
        return Err(AuthError::MalformedInput("Invalid password format".into()));
    }

    if username == config.admin_username && password == config.admin_password {
        Ok(())
    } else {
        Err(AuthError::InvalidCredentials)
    }
}
