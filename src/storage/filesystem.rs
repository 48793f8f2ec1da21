//! File system primitives
//!
//! Atomic replacement and iterative tree removal used by the storage
//! operations.

use std::fs::{self, Metadata};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Metadata that treats a missing path as `None`
pub fn stat_optional(path: &Path) -> io::Result<Option<Metadata>> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(Some(metadata)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Like [`stat_optional`] but does not follow a trailing symlink
pub fn lstat_optional(path: &Path) -> io::Result<Option<Metadata>> {
    match fs::symlink_metadata(path) {
        Ok(metadata) => Ok(Some(metadata)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Modification time in milliseconds since the Unix epoch, 0 if unknown
pub fn modified_millis(metadata: &Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|dur| dur.as_millis() as u64)
        .unwrap_or(0)
}

/// Replaces `path` with `bytes` via a temp file in the same directory.
///
/// Readers see either the old content or the new content, never a partial
/// write. An existing file keeps its permissions; a new one gets the same
/// mode a plain create would. The temp file is removed if anything fails
/// before the rename.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    let existing = stat_optional(path)?.map(|metadata| metadata.permissions());

    let mut builder = tempfile::Builder::new();
    builder.prefix(".drive-").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Masked by the process umask at creation.
        builder.permissions(fs::Permissions::from_mode(0o666));
    }

    let mut temp = builder.tempfile_in(dir)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    temp.as_file().sync_all()?;
    if let Some(permissions) = existing {
        temp.as_file().set_permissions(permissions)?;
    }
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Removes a file, symlink or whole directory tree.
///
/// Walks depth-first with an explicit stack; every child is removed before
/// its directory. Symlinks are unlinked, never followed. Stops at the first
/// failure and reports the path that could not be removed along with the
/// number of entries already gone.
pub fn remove_tree(target: &Path) -> Result<usize, (PathBuf, usize, io::Error)> {
    let mut removed = 0;

    let metadata = fs::symlink_metadata(target).map_err(|e| (target.to_path_buf(), removed, e))?;
    if !metadata.is_dir() {
        fs::remove_file(target).map_err(|e| (target.to_path_buf(), removed, e))?;
        return Ok(1);
    }

    // (directory, children already pushed)
    let mut stack: Vec<(PathBuf, bool)> = vec![(target.to_path_buf(), false)];

    while let Some((dir, expanded)) = stack.pop() {
        if expanded {
            fs::remove_dir(&dir).map_err(|e| (dir.clone(), removed, e))?;
            removed += 1;
            continue;
        }

        stack.push((dir.clone(), true));

        let entries = fs::read_dir(&dir).map_err(|e| (dir.clone(), removed, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| (dir.clone(), removed, e))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| (path.clone(), removed, e))?;

            if file_type.is_dir() {
                stack.push((path, false));
            } else {
                fs::remove_file(&path).map_err(|e| (path.clone(), removed, e))?;
                removed += 1;
            }
        }
    }

    Ok(removed)
}
