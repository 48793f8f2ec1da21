//! Path resolution
//!
//! Maps client-supplied virtual paths onto real paths confined to the
//! storage root. Every filesystem operation goes through [`PathResolver`].

use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{StorageError, StorageResult};

/// Confines virtual paths to a single storage root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Creates the storage root if needed and pins its canonical form.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;
        let root = root.canonicalize()?;
        Ok(Self { root })
    }

    /// Canonical storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `path` is the storage root itself
    pub fn is_root(&self, path: &Path) -> bool {
        path == self.root
    }

    /// Lexically normalizes a virtual path to `/a/b` form.
    ///
    /// `.` and empty segments are dropped, `..` pops a segment. Climbing above
    /// the root is a traversal attempt, not a clamp.
    pub fn normalize(virtual_path: &str) -> StorageResult<String> {
        let segments = normalized_segments(virtual_path)?;
        Ok(format!("/{}", segments.join("/")))
    }

    /// Resolves a virtual path to a real path inside the storage root.
    ///
    /// The target does not need to exist. Existing ancestors are
    /// canonicalized so a symlink inside the tree cannot lead out of it.
    pub fn resolve(&self, virtual_path: &str) -> StorageResult<PathBuf> {
        let segments = normalized_segments(virtual_path)?;

        let Some((last, parents)) = segments.split_last() else {
            return Ok(self.root.clone());
        };

        let lexical_parent = parents
            .iter()
            .fold(self.root.clone(), |path, segment| path.join(segment));
        let resolved = canonicalize_existing_prefix(&lexical_parent).join(last);

        self.ensure_contained(&resolved, virtual_path)?;

        // The leaf itself may be a symlink; follow it only for the check.
        if let Ok(target) = resolved.canonicalize() {
            self.ensure_contained(&target, virtual_path)?;
        }

        debug!("Resolved {} -> {}", virtual_path, resolved.display());
        Ok(resolved)
    }

    /// Resolves `parent/name` and verifies the result lies strictly inside
    /// the resolved parent.
    ///
    /// Returns the real path and its normalized virtual path.
    pub fn resolve_child(&self, parent: &str, name: &str) -> StorageResult<(PathBuf, String)> {
        let joined = format!("{}/{}", parent, name);
        let parent_real = self.resolve(parent)?;
        let child_real = self.resolve(&joined)?;

        if child_real == parent_real || !child_real.starts_with(&parent_real) {
            warn!("Rejected child {:?} escaping parent {}", name, parent);
            return Err(StorageError::PathTraversal(joined));
        }

        Ok((child_real, Self::normalize(&joined)?))
    }

    /// Virtual form of a real path under the root, for logs and errors.
    pub fn to_virtual(&self, real: &Path) -> String {
        match real.strip_prefix(&self.root) {
            Ok(relative) => {
                let segments: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                format!("/{}", segments.join("/"))
            }
            Err(_) => "/".to_string(),
        }
    }

    fn ensure_contained(&self, path: &Path, virtual_path: &str) -> StorageResult<()> {
        // Component-wise: /storage2 does not start with /storage.
        if path.starts_with(&self.root) {
            Ok(())
        } else {
            warn!("Path traversal attempt: {:?}", virtual_path);
            Err(StorageError::PathTraversal(virtual_path.to_string()))
        }
    }
}

fn normalized_segments(virtual_path: &str) -> StorageResult<Vec<&str>> {
    if virtual_path.contains(['\0', '\\']) {
        return Err(StorageError::InvalidPath(virtual_path.escape_default().to_string()));
    }

    let mut segments = Vec::new();
    for segment in virtual_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    warn!("Path climbs above storage root: {:?}", virtual_path);
                    return Err(StorageError::PathTraversal(virtual_path.to_string()));
                }
            }
            name => segments.push(name),
        }
    }
    Ok(segments)
}

/// Canonicalizes the longest existing ancestor of `path` and re-appends the
/// rest.
fn canonicalize_existing_prefix(path: &Path) -> PathBuf {
    let mut tail = Vec::new();
    let mut current = path;

    loop {
        if let Ok(canonical) = current.canonicalize() {
            return tail
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, part| acc.join(part));
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                current = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}
