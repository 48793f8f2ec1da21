//! Storage operations
//!
//! Handles the file system operations behind each drive request: list, stat,
//! read, download, write, mkdir, rename, delete and upload.
//!
//! All functions are blocking and role-agnostic. Callers check the role and
//! move the call off the async runtime.

use log::{debug, error, info, warn};
use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use crate::config::DriveConfig;
use crate::error::{StorageError, StorageResult};
use crate::storage::filesystem::{
    atomic_write, lstat_optional, modified_millis, remove_tree, stat_optional,
};
use crate::storage::resolver::PathResolver;
use crate::storage::results::{
    DeleteResult, DirectoryEntry, DownloadTarget, EntryKind, UploadItem, UploadRejection,
    UploadReport,
};
use crate::storage::validation::{ensure_text_like, ensure_within_limit, validate_entry_name};

/// Lists the contents of a directory
///
/// Directories come first, then files; each group is sorted by name the way
/// an English locale collates: accents and case only break ties, and
/// lowercase sorts before uppercase.
pub fn list_directory(
    resolver: &PathResolver,
    virtual_path: &str,
) -> StorageResult<Vec<DirectoryEntry>> {
    let real_path = resolver.resolve(virtual_path)?;

    let metadata = stat_optional(&real_path)
        .map_err(|e| StorageError::io(virtual_path, e))?
        .ok_or_else(|| StorageError::NotFound(virtual_path.to_string()))?;
    if !metadata.is_dir() {
        return Err(StorageError::NotADirectory(virtual_path.to_string()));
    }

    let entries = fs::read_dir(&real_path).map_err(|e| {
        error!("Failed to list directory {}: {}", virtual_path, e);
        StorageError::io(virtual_path, e)
    })?;

    let mut listing = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();

        // Follow symlinks for display, fall back to the link itself.
        let metadata = match fs::metadata(&path).or_else(|_| fs::symlink_metadata(&path)) {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!("Skipping {} in {}: {}", name, virtual_path, e);
                continue;
            }
        };

        let kind = if metadata.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        };
        let size = if metadata.is_dir() { 0 } else { metadata.len() };

        listing.push(DirectoryEntry {
            name,
            kind,
            size,
            modified_ms: modified_millis(&metadata),
        });
    }

    sort_entries(&mut listing);

    info!("Listed directory {} - {} entries", virtual_path, listing.len());

    Ok(listing)
}

fn sort_entries(entries: &mut [DirectoryEntry]) {
    entries.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| compare_names(&a.name, &b.name)));
}

fn compare_names(a: &str, b: &str) -> Ordering {
    let base = |name: &str| -> String {
        name.chars()
            .flat_map(char::to_lowercase)
            .map(fold_accent)
            .collect()
    };
    let upper_marks = |name: &str| -> Vec<bool> { name.chars().map(char::is_uppercase).collect() };

    base(a)
        .cmp(&base(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| upper_marks(a).cmp(&upper_marks(b)))
        .then_with(|| a.cmp(b))
}

/// Base letter of a lowercase Latin-1 accented letter
fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Describes a single file or directory
pub fn stat_entry(resolver: &PathResolver, virtual_path: &str) -> StorageResult<DirectoryEntry> {
    let real_path = resolver.resolve(virtual_path)?;
    let metadata = stat_optional(&real_path)
        .map_err(|e| StorageError::io(virtual_path, e))?
        .ok_or_else(|| StorageError::NotFound(virtual_path.to_string()))?;

    let name = real_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(DirectoryEntry {
        name,
        kind: if metadata.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        },
        size: if metadata.is_dir() { 0 } else { metadata.len() },
        modified_ms: modified_millis(&metadata),
    })
}

/// Reads a text-like file within the edit size ceiling
pub fn read_text_file(
    resolver: &PathResolver,
    config: &DriveConfig,
    virtual_path: &str,
) -> StorageResult<String> {
    let real_path = resolver.resolve(virtual_path)?;

    let metadata = stat_optional(&real_path)
        .map_err(|e| StorageError::io(virtual_path, e))?
        .ok_or_else(|| StorageError::NotFound(virtual_path.to_string()))?;
    if metadata.is_dir() {
        return Err(StorageError::IsADirectory(virtual_path.to_string()));
    }

    ensure_text_like(&real_path, virtual_path)?;
    ensure_within_limit(virtual_path, metadata.len(), config.max_edit_size_bytes)?;

    let bytes = fs::read(&real_path).map_err(|e| StorageError::io(virtual_path, e))?;
    // The file may have grown between stat and read.
    ensure_within_limit(virtual_path, bytes.len() as u64, config.max_edit_size_bytes)?;

    let content =
        String::from_utf8(bytes).map_err(|_| StorageError::InvalidUtf8(virtual_path.to_string()))?;

    info!("Read {} ({} bytes)", virtual_path, content.len());
    Ok(content)
}

/// Prepares a file of any type for download
pub fn prepare_download(
    resolver: &PathResolver,
    virtual_path: &str,
) -> StorageResult<DownloadTarget> {
    let file_path = resolver.resolve(virtual_path)?;

    let metadata = stat_optional(&file_path)
        .map_err(|e| StorageError::io(virtual_path, e))?
        .ok_or_else(|| StorageError::NotFound(virtual_path.to_string()))?;
    if metadata.is_dir() {
        return Err(StorageError::IsADirectory(virtual_path.to_string()));
    }

    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    info!("Prepared download for {} ({} bytes)", virtual_path, metadata.len());

    Ok(DownloadTarget {
        virtual_path: PathResolver::normalize(virtual_path)?,
        file_name,
        size: metadata.len(),
        file_path,
    })
}

/// Writes a text-like file, creating parent directories as needed
///
/// The previous content stays intact unless the new content lands in full.
pub fn write_text_file(
    resolver: &PathResolver,
    config: &DriveConfig,
    virtual_path: &str,
    content: &str,
) -> StorageResult<()> {
    let real_path = resolver.resolve(virtual_path)?;

    if resolver.is_root(&real_path) {
        return Err(StorageError::IsADirectory(virtual_path.to_string()));
    }

    ensure_text_like(&real_path, virtual_path)?;
    ensure_within_limit(virtual_path, content.len() as u64, config.max_edit_size_bytes)?;

    let existing = stat_optional(&real_path).map_err(|e| StorageError::io(virtual_path, e))?;
    if let Some(metadata) = existing {
        if metadata.is_dir() {
            return Err(StorageError::IsADirectory(virtual_path.to_string()));
        }
    }

    if let Some(parent) = real_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            error!("Failed to create parent of {}: {}", virtual_path, e);
            StorageError::io(virtual_path, e)
        })?;
    }

    atomic_write(&real_path, content.as_bytes()).map_err(|e| {
        error!("Failed to write {}: {}", virtual_path, e);
        StorageError::io(virtual_path, e)
    })?;

    info!("Wrote {} ({} bytes)", virtual_path, content.len());
    Ok(())
}

/// Creates `name` under `parent_virtual_path`, including intermediate
/// directories. Succeeds if the directory already exists.
pub fn make_directory(
    resolver: &PathResolver,
    parent_virtual_path: &str,
    name: &str,
) -> StorageResult<String> {
    if name.trim().is_empty() {
        return Err(StorageError::InvalidPath("Empty directory name".into()));
    }

    let (dir_path, virtual_dir_path) = resolver.resolve_child(parent_virtual_path, name)?;

    let existing =
        stat_optional(&dir_path).map_err(|e| StorageError::io(&virtual_dir_path, e))?;
    if let Some(metadata) = existing {
        if metadata.is_dir() {
            debug!("Directory {} already exists", virtual_dir_path);
            return Ok(virtual_dir_path);
        }
        return Err(StorageError::NotADirectory(virtual_dir_path));
    }

    fs::create_dir_all(&dir_path).map_err(|e| {
        error!("Failed to create directory {}: {}", virtual_dir_path, e);
        StorageError::io(&virtual_dir_path, e)
    })?;

    info!("Created directory {}", virtual_dir_path);
    Ok(virtual_dir_path)
}

/// Renames an entry within its own parent directory
///
/// Never overwrites: an existing destination of any kind fails with
/// `AlreadyExists`. Renaming to the current name is a no-op.
pub fn rename_entry(
    resolver: &PathResolver,
    virtual_path: &str,
    new_name: &str,
) -> StorageResult<String> {
    let source = resolver.resolve(virtual_path)?;
    if resolver.is_root(&source) {
        return Err(StorageError::InvalidPath("Cannot rename storage root".into()));
    }

    lstat_optional(&source)
        .map_err(|e| StorageError::io(virtual_path, e))?
        .ok_or_else(|| StorageError::NotFound(virtual_path.to_string()))?;

    validate_entry_name(new_name)?;

    let normalized = PathResolver::normalize(virtual_path)?;
    let parent_virtual = parent_of(&normalized);
    let (destination, virtual_destination) = resolver.resolve_child(parent_virtual, new_name)?;

    if destination == source {
        debug!("Rename of {} to itself ignored", normalized);
        return Ok(virtual_destination);
    }

    if lstat_optional(&destination)
        .map_err(|e| StorageError::io(&virtual_destination, e))?
        .is_some()
    {
        warn!("Rename {} -> {} blocked: destination exists", normalized, virtual_destination);
        return Err(StorageError::AlreadyExists(virtual_destination));
    }

    fs::rename(&source, &destination).map_err(|e| {
        error!("Failed to rename {} -> {}: {}", normalized, virtual_destination, e);
        StorageError::io(virtual_path, e)
    })?;

    info!("Renamed {} -> {}", normalized, virtual_destination);
    Ok(virtual_destination)
}

fn parent_of(normalized: &str) -> &str {
    match normalized.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &normalized[..idx],
    }
}

/// Deletes a file or a directory tree
///
/// Stops at the first entry that cannot be removed and reports it; whatever
/// was removed before that stays removed.
pub fn delete_entry(resolver: &PathResolver, virtual_path: &str) -> StorageResult<DeleteResult> {
    let target = resolver.resolve(virtual_path)?;
    if resolver.is_root(&target) {
        return Err(StorageError::InvalidPath("Cannot delete storage root".into()));
    }

    lstat_optional(&target)
        .map_err(|e| StorageError::io(virtual_path, e))?
        .ok_or_else(|| StorageError::NotFound(virtual_path.to_string()))?;

    match remove_tree(&target) {
        Ok(removed_entries) => {
            let virtual_path = resolver.to_virtual(&target);
            info!("Deleted {} ({} entries)", virtual_path, removed_entries);
            Ok(DeleteResult {
                virtual_path,
                removed_entries,
            })
        }
        Err((failed_path, removed, e)) => {
            let failed_virtual = resolver.to_virtual(&failed_path);
            error!(
                "Delete of {} stopped at {} after {} entries: {}",
                virtual_path, failed_virtual, removed, e
            );
            Err(StorageError::Io {
                path: failed_virtual,
                source: e,
            })
        }
    }
}

/// Saves uploaded files into an existing directory
///
/// Items are handled independently: an item with an escaping or empty name,
/// or one over the per-file ceiling, is rejected and reported while the
/// others are still written. Existing files with the same name are replaced.
pub fn save_uploads(
    resolver: &PathResolver,
    config: &DriveConfig,
    dir_virtual_path: &str,
    items: &[UploadItem],
) -> StorageResult<UploadReport> {
    if items.len() > config.max_upload_files {
        return Err(StorageError::TooManyFiles {
            count: items.len(),
            limit: config.max_upload_files,
        });
    }

    let dir_path = resolver.resolve(dir_virtual_path)?;
    let metadata = stat_optional(&dir_path)
        .map_err(|e| StorageError::io(dir_virtual_path, e))?
        .ok_or_else(|| StorageError::NotFound(dir_virtual_path.to_string()))?;
    if !metadata.is_dir() {
        return Err(StorageError::NotADirectory(dir_virtual_path.to_string()));
    }

    let mut report = UploadReport::default();

    for item in items {
        match save_upload_item(resolver, config, dir_virtual_path, &dir_path, item) {
            Ok(virtual_file_path) => {
                info!(
                    "Uploaded {} ({} bytes)",
                    virtual_file_path,
                    item.content.len()
                );
                report.saved.push(item.original_name.clone());
            }
            Err(e) => {
                warn!("Rejected upload {:?}: {}", item.original_name, e);
                report.rejected.push(UploadRejection {
                    name: item.original_name.clone(),
                    error: e,
                });
            }
        }
    }

    Ok(report)
}

fn save_upload_item(
    resolver: &PathResolver,
    config: &DriveConfig,
    dir_virtual_path: &str,
    dir_path: &Path,
    item: &UploadItem,
) -> StorageResult<String> {
    if item.original_name.trim().is_empty() {
        return Err(StorageError::InvalidPath("Empty filename".into()));
    }

    let (file_path, virtual_file_path) =
        resolver.resolve_child(dir_virtual_path, &item.original_name)?;

    // Re-check against the directory resolved for this request.
    if !file_path.starts_with(dir_path) || file_path == dir_path {
        return Err(StorageError::PathTraversal(virtual_file_path));
    }

    ensure_within_limit(
        &virtual_file_path,
        item.content.len() as u64,
        config.max_upload_file_bytes,
    )?;

    if let Some(metadata) =
        stat_optional(&file_path).map_err(|e| StorageError::io(&virtual_file_path, e))?
    {
        if metadata.is_dir() {
            return Err(StorageError::IsADirectory(virtual_file_path));
        }
    }

    atomic_write(&file_path, &item.content)
        .map_err(|e| StorageError::io(&virtual_file_path, e))?;

    Ok(virtual_file_path)
}
