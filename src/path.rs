//! # Path Resolution
//!
//! Object keys are backend-relative, `/`-separated strings. The local backend
//! maps them onto a root directory (plus an optional sub path) lexically:
//!
//! - leading `/`, empty segments and `.` segments are dropped
//! - `\` is treated as a separator
//! - any `..` segment is rejected, so no key can leave the root
//!
//! No symlinks are followed during resolution; the OS resolves them when the
//! resulting path is opened.

use std::path::{Path, PathBuf};

use crate::FsError;

/// Normalize an object key into its canonical `a/b/c` form.
///
/// The empty string denotes the root.
pub fn normalize_key(path: &str) -> Result<String, FsError> {
    let replaced = path.replace('\\', "/");
    let mut segments = Vec::new();
    for segment in replaced.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                return Err(FsError::InvalidPath {
                    path: path.to_owned(),
                    reason: "parent segments are not allowed",
                });
            }
            s if s.contains('\0') => {
                return Err(FsError::InvalidPath {
                    path: path.to_owned(),
                    reason: "contains a NUL byte",
                });
            }
            s => segments.push(s),
        }
    }
    Ok(segments.join("/"))
}

/// The last segment of a normalized key, or `""` for the root.
pub(crate) fn file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Root directory that object keys resolve under.
#[derive(Debug, Clone)]
pub(crate) struct RootDir {
    base: PathBuf,
}

impl RootDir {
    /// `sub_path` is normalized like any key and appended to `root`.
    pub(crate) fn new(root: &Path, sub_path: Option<&str>) -> Result<Self, FsError> {
        let mut base = root.to_path_buf();
        if let Some(sub) = sub_path {
            let sub = normalize_key(sub)?;
            base.extend(sub.split('/').filter(|s| !s.is_empty()));
        }
        Ok(Self { base })
    }

    /// Directory every key resolves under.
    pub(crate) fn base(&self) -> &Path {
        &self.base
    }

    /// Resolve an already-normalized key.
    pub(crate) fn join_key(&self, key: &str) -> PathBuf {
        let mut full = self.base.clone();
        full.extend(key.split('/').filter(|s| !s.is_empty()));
        full
    }

    /// Normalize `path` and resolve it, returning both forms.
    pub(crate) fn resolve(&self, path: &str) -> Result<(String, PathBuf), FsError> {
        let key = normalize_key(path)?;
        let full = self.join_key(&key);
        Ok((key, full))
    }
}
