//! Input validation
//!
//! Extension allow-list, size ceilings and entry-name checks.

use std::path::Path;

use crate::error::{StorageError, StorageResult};

/// Extensions that may be read and edited as text.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "md", "markdown", "txt", "log", "json", "csv", "yml", "yaml", "ini", "conf",
];

/// Whether the path carries a text-like extension (case-insensitive)
pub fn is_text_like(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            TEXT_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

pub fn ensure_text_like(path: &Path, virtual_path: &str) -> StorageResult<()> {
    if is_text_like(path) {
        Ok(())
    } else {
        Err(StorageError::UnsupportedType(virtual_path.to_string()))
    }
}

pub fn ensure_within_limit(virtual_path: &str, size: u64, limit: u64) -> StorageResult<()> {
    if size > limit {
        return Err(StorageError::TooLarge {
            path: virtual_path.to_string(),
            size,
            limit,
        });
    }
    Ok(())
}

/// Validates a single path segment such as a rename target.
pub fn validate_entry_name(name: &str) -> StorageResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(StorageError::InvalidPath(name.escape_default().to_string()));
    }
    Ok(())
}
