//! Error handlers
//!
//! Converts drive errors into HTTP status codes and client-safe messages.

use std::io;

use log::{error, warn};

use crate::error::types::{AuthError, DriveError, StorageError};

/// Log an error with full server-side detail
pub fn handle_error(err: &DriveError) {
    match error_to_status(err) {
        500.. => error!("Drive error: {}", err),
        _ => warn!("Request rejected: {}", err),
    }
}

/// Convert error to HTTP status code
pub fn error_to_status(err: &DriveError) -> u16 {
    match err {
        DriveError::Storage(e) => storage_status(e),
        DriveError::Auth(e) => match e {
            AuthError::Forbidden => 403,
            AuthError::InvalidCredentials | AuthError::MalformedInput(_) => 401,
            AuthError::IssueFailed(_) => 500,
        },
        DriveError::Config(_) | DriveError::Io(_) | DriveError::Task(_) => 500,
    }
}

fn storage_status(err: &StorageError) -> u16 {
    match err {
        StorageError::NotFound(_) => 404,
        StorageError::UnsupportedType(_) | StorageError::InvalidUtf8(_) => 415,
        StorageError::TooLarge { .. } => 413,
        StorageError::PathTraversal(_)
        | StorageError::InvalidPath(_)
        | StorageError::NotADirectory(_)
        | StorageError::IsADirectory(_)
        | StorageError::AlreadyExists(_)
        | StorageError::TooManyFiles { .. } => 400,
        StorageError::Io { source, .. } => match source.kind() {
            io::ErrorKind::InvalidInput
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::DirectoryNotEmpty
            | io::ErrorKind::NotADirectory
            | io::ErrorKind::IsADirectory => 400,
            _ => 500,
        },
    }
}

/// Short message suitable for the response body.
///
/// Never includes resolved filesystem paths or IO error detail.
pub fn client_message(err: &DriveError) -> String {
    match err {
        DriveError::Storage(e) => match e {
            StorageError::PathTraversal(_) | StorageError::InvalidPath(_) => "Invalid path".into(),
            StorageError::NotFound(_) => "Not found".into(),
            StorageError::NotADirectory(_) => "Not a directory".into(),
            StorageError::IsADirectory(_) => "Is a directory".into(),
            StorageError::UnsupportedType(_) => "Unsupported file type".into(),
            StorageError::TooLarge { limit, .. } => {
                format!("File too large (limit {} bytes)", limit)
            }
            StorageError::InvalidUtf8(_) => "File is not valid UTF-8 text".into(),
            StorageError::AlreadyExists(_) => "Destination already exists".into(),
            StorageError::TooManyFiles { limit, .. } => {
                format!("Too many files (limit {})", limit)
            }
            StorageError::Io { source, .. } => match source.kind() {
                io::ErrorKind::PermissionDenied => "Permission denied".into(),
                _ => "Storage operation failed".into(),
            },
        },
        DriveError::Auth(AuthError::Forbidden) => "Forbidden: admin only".into(),
        DriveError::Auth(AuthError::InvalidCredentials | AuthError::MalformedInput(_)) => {
            "Invalid credentials".into()
        }
        DriveError::Auth(AuthError::IssueFailed(_))
        | DriveError::Config(_)
        | DriveError::Io(_)
        | DriveError::Task(_) => {
            "Internal server error".into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(e: StorageError) -> DriveError {
        DriveError::Storage(e)
    }

    #[test]
    fn test_storage_status_codes() {
        assert_eq!(error_to_status(&storage(StorageError::NotFound("/a".into()))), 404);
        assert_eq!(error_to_status(&storage(StorageError::PathTraversal("/..".into()))), 400);
        assert_eq!(error_to_status(&storage(StorageError::IsADirectory("/d".into()))), 400);
        assert_eq!(error_to_status(&storage(StorageError::UnsupportedType("/a.exe".into()))), 415);
        let too_large = StorageError::TooLarge {
            path: "/big.txt".into(),
            size: 10,
            limit: 5,
        };
        assert_eq!(error_to_status(&storage(too_large)), 413);
    }

    #[test]
    fn test_auth_status_codes() {
        assert_eq!(error_to_status(&DriveError::Auth(AuthError::Forbidden)), 403);
        assert_eq!(error_to_status(&DriveError::Auth(AuthError::InvalidCredentials)), 401);
    }

    #[test]
    fn test_io_error_message_hides_detail() {
        let err = storage(StorageError::Io {
            path: "/docs".into(),
            source: io::Error::new(io::ErrorKind::Other, "/srv/storage/docs: disk exploded"),
        });
        assert_eq!(error_to_status(&err), 500);
        let message = client_message(&err);
        assert!(!message.contains("/srv"));
        assert_eq!(message, "Storage operation failed");
    }

    #[test]
    fn test_traversal_message_is_generic() {
        let err = storage(StorageError::PathTraversal("/../../etc/passwd".into()));
        assert_eq!(client_message(&err), "Invalid path");
    }
}
