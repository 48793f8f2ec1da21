//! Storage result types
//!
//! Defines result structures returned by storage operations.

use serde::Serialize;
use std::path::PathBuf;

use crate::error::StorageError;

/// Kind of a listed filesystem object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Dir,
    File,
}

/// One filesystem object as seen by a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Byte length for files, 0 for directories
    pub size: u64,
    #[serde(rename = "mtimeMs")]
    pub modified_ms: u64,
}

impl DirectoryEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// A decoded file from an upload request
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub original_name: String,
    pub content: Vec<u8>,
}

impl UploadItem {
    pub fn new(original_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            original_name: original_name.into(),
            content: content.into(),
        }
    }
}

/// An upload item that was not written
#[derive(Debug)]
pub struct UploadRejection {
    pub name: String,
    pub error: StorageError,
}

/// Outcome of a multi-file upload
#[derive(Debug, Default)]
pub struct UploadReport {
    pub saved: Vec<String>,
    pub rejected: Vec<UploadRejection>,
}

/// A file ready to be streamed to a client
#[derive(Debug, Clone)]
pub struct DownloadTarget {
    pub file_path: PathBuf,
    pub virtual_path: String,
    pub file_name: String,
    pub size: u64,
}

/// Result of a delete operation
#[derive(Debug, Clone)]
pub struct DeleteResult {
    pub virtual_path: String,
    pub removed_entries: usize,
}
