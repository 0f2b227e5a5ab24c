//! Content discovery: the tree walker.
//!
//! Before anything is classified or encoded, mdpack enumerates every regular
//! file under the input root. The walk is lazy and single-pass; each item is
//! yielded with its root-relative, `/`-separated path so that manifests look
//! the same on every platform.

use std::path::{Path, PathBuf};

use mdpack_shared::{ItemError, MdpackError, Result};
use tracing::{debug, instrument};
use walkdir::WalkDir;

// ---------------------------------------------------------------------------
// DiscoveredFile
// ---------------------------------------------------------------------------

/// A regular file found under the walk root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Full path, suitable for opening the file.
    pub path: PathBuf,
    /// Path relative to the root, joined with `/`.
    pub relative: String,
}

// ---------------------------------------------------------------------------
// FileWalk
// ---------------------------------------------------------------------------

/// Lazy iterator over the regular files beneath a root directory.
///
/// Symbolic links, directories, and special files are never yielded. Order is
/// whatever the filesystem returns. Entries that cannot be read mid-walk
/// (for instance a subdirectory without list permission) and files whose
/// relative path is not valid UTF-8 come out as [`ItemError`]s; they never
/// end the walk.
pub struct FileWalk {
    root: PathBuf,
    inner: walkdir::IntoIter,
}

impl std::fmt::Debug for FileWalk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWalk").field("root", &self.root).finish()
    }
}

impl Iterator for FileWalk {
    type Item = std::result::Result<DiscoveredFile, ItemError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .and_then(|p| p.strip_prefix(&self.root).ok())
                        .unwrap_or_else(|| Path::new("."))
                        .display()
                        .to_string();
                    return Some(Err(ItemError::read(path, e.into())));
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = match relative_path(&self.root, entry.path()) {
                Some(Ok(relative)) => relative,
                Some(Err(lossy)) => {
                    return Some(Err(ItemError::read(
                        lossy,
                        std::io::Error::new(
                            std::io::ErrorKind::InvalidData,
                            "path is not valid UTF-8",
                        ),
                    )));
                }
                None => {
                    debug!(path = %entry.path().display(), "entry outside walk root, skipping");
                    continue;
                }
            };

            return Some(Ok(DiscoveredFile {
                path: entry.into_path(),
                relative,
            }));
        }
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Start walking `root`.
///
/// Fails with a configuration error when `root` does not exist or is not a
/// directory. Nothing is read until the returned iterator is advanced.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn walk(root: &Path) -> Result<FileWalk> {
    let metadata = std::fs::metadata(root).map_err(|e| {
        MdpackError::config(format!("{} is not a valid directory: {e}", root.display()))
    })?;

    if !metadata.is_dir() {
        return Err(MdpackError::config(format!(
            "{} is not a valid directory",
            root.display()
        )));
    }

    debug!("starting walk");

    Ok(FileWalk {
        root: root.to_path_buf(),
        inner: WalkDir::new(root)
            .follow_links(false)
            .min_depth(1)
            .into_iter(),
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Express `path` relative to `root` with `/` separators.
///
/// `None` when `path` is not below `root`; `Err` carries a lossy rendering
/// when a component is not valid UTF-8, since a lossy name could collide
/// with another file's.
fn relative_path(root: &Path, path: &Path) -> Option<std::result::Result<String, String>> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect();

    match parts {
        Some(parts) if parts.is_empty() => None,
        Some(parts) => Some(Ok(parts.join("/"))),
        None => Some(Err(rel.to_string_lossy().replace('\\', "/"))),
    }
}
