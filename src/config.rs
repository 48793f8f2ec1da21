//! Configuration management for the drive
//!
//! Everything here is resolved once at process start and then shared
//! read-only. Values come from an optional `drive.toml` with `DRIVE_*`
//! environment overrides on top.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "drive";
pub const ENV_PREFIX: &str = "DRIVE";

const MIB: u64 = 1024 * 1024;
const DEFAULT_MAX_EDIT_SIZE: u64 = 2 * MIB;
const DEFAULT_MAX_UPLOAD_FILE_SIZE: u64 = 50 * MIB;
const DEFAULT_MAX_UPLOAD_FILES: usize = 20;
const DEFAULT_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Drive configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DriveConfig {
    /// Root directory of the virtual tree.
    /// Environment: DRIVE_STORAGE_ROOT
    pub storage_root: String,

    /// The single administrator account.
    /// Environment: DRIVE_ADMIN_USERNAME / DRIVE_ADMIN_PASSWORD
    pub admin_username: String,
    pub admin_password: String,

    /// Ceiling for in-browser read/edit of text files
    pub max_edit_size_bytes: u64,

    /// Upload limits, per file and per request
    pub max_upload_file_bytes: u64,
    pub max_upload_files: usize,

    /// Cookie that carries the role credential
    pub token_cookie_name: String,
    pub token_ttl_secs: u64,

    /// Longest accepted username or password at login
    pub max_credential_length: usize,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            storage_root: "./storage".to_string(),
            admin_username: "admin".to_string(),
            admin_password: "admin123".to_string(),
            max_edit_size_bytes: DEFAULT_MAX_EDIT_SIZE,
            max_upload_file_bytes: DEFAULT_MAX_UPLOAD_FILE_SIZE,
            max_upload_files: DEFAULT_MAX_UPLOAD_FILES,
            token_cookie_name: "token".to_string(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            max_credential_length: 256,
        }
    }
}

impl DriveConfig {
    /// Load configuration from `drive.toml` (optional) with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from the named file (extension optional)
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let settings = Config::builder()
            .set_default("storage_root", defaults.storage_root)?
            .set_default("admin_username", defaults.admin_username)?
            .set_default("admin_password", defaults.admin_password)?
            .set_default("max_edit_size_bytes", defaults.max_edit_size_bytes as i64)?
            .set_default("max_upload_file_bytes", defaults.max_upload_file_bytes as i64)?
            .set_default("max_upload_files", defaults.max_upload_files as i64)?
            .set_default("token_cookie_name", defaults.token_cookie_name)?
            .set_default("token_ttl_secs", defaults.token_ttl_secs as i64)?
            .set_default("max_credential_length", defaults.max_credential_length as i64)?
            .add_source(File::with_name(config_path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let config: DriveConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_root.trim().is_empty() {
            return Err(ConfigError::Message("storage_root cannot be empty".into()));
        }

        if self.admin_username.trim().is_empty() || self.admin_password.is_empty() {
            return Err(ConfigError::Message(
                "admin_username and admin_password must be set".into(),
            ));
        }

        if self.max_edit_size_bytes == 0 {
            return Err(ConfigError::Message(
                "max_edit_size_bytes must be greater than 0".into(),
            ));
        }

        if self.max_upload_file_bytes == 0 || self.max_upload_files == 0 {
            return Err(ConfigError::Message(
                "upload limits must be greater than 0".into(),
            ));
        }

        if self.token_cookie_name.is_empty()
            || self
                .token_cookie_name
                .contains(|c: char| c.is_whitespace() || matches!(c, ';' | ',' | '='))
        {
            return Err(ConfigError::Message(
                "token_cookie_name must be a valid cookie name".into(),
            ));
        }

        if self.token_ttl_secs == 0 {
            return Err(ConfigError::Message(
                "token_ttl_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Get storage root as PathBuf
    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    /// Credential lifetime as Duration
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}
