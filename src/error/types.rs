//! Error types
//!
//! Defines domain-specific error types for each module of the drive.

use std::io;

use thiserror::Error;

/// Storage module errors
///
/// Every variant carries the virtual path supplied by the client, never the
/// resolved absolute path.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Path traversal attempt: {0}")]
    PathTraversal(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Not a directory: {0}")]
    NotADirectory(String),
    #[error("Is a directory: {0}")]
    IsADirectory(String),
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),
    #[error("Too large: {path} ({size} bytes, limit {limit})")]
    TooLarge { path: String, size: u64, limit: u64 },
    #[error("Not valid UTF-8 text: {0}")]
    InvalidUtf8(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Too many files: {count} (limit {limit})")]
    TooManyFiles { count: usize, limit: usize },
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    /// Wraps an IO error, turning `NotFound` into the typed variant.
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(path),
            _ => StorageError::Io { path, source },
        }
    }
}

/// Authentication module errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Forbidden: admin only")]
    Forbidden,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    #[error("Token issuance failed: {0}")]
    IssueFailed(String),
}

/// General drive error that encompasses all error types
#[derive(Debug, Error)]
pub enum DriveError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for DriveError {
    fn from(error: tokio::task::JoinError) -> Self {
        DriveError::Task(error.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
pub type DriveResult<T> = Result<T, DriveError>;
