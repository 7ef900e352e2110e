//! # Local Disk Backend
//!
//! [`LocalFs`] maps object keys onto a directory tree and emulates the
//! multipart protocol with [`MultipartUploads`]. It implements the whole
//! [`FileSystem`](crate::FileSystem) capability set, so it can stand in for
//! any cloud driver.
//!
//! ## Layout
//!
//! ```text
//! <root_path>/<sub_path>/...          objects
//! <root_path>/.multipart/<id>.json    session records (FileStateStore)
//! <root_path>/.multipart/parts/       part blobs
//! ```
//!
//! The state and parts directories are hidden from listings and cannot be
//! addressed through object keys.

mod dirs;
mod files;
mod metadata;
mod multipart;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::LocalConfig;
use crate::multipart::{FileStateStore, MultipartUploads, StateStore};
use crate::path::RootDir;
use crate::{FileType, FsError, Metadata, Permissions};

/// Filesystem backend over a local directory.
///
/// # Example
///
/// ```rust
/// use objfs::{FsRead, FsWrite, LocalConfig, LocalFs};
///
/// let dir = tempfile::tempdir().unwrap();
/// let fs = LocalFs::new(LocalConfig::new(dir.path())).unwrap();
/// fs.write("docs/readme.txt", b"hi").unwrap();
/// assert_eq!(fs.read("docs/readme.txt").unwrap(), b"hi");
/// ```
#[derive(Debug)]
pub struct LocalFs {
    root: RootDir,
    reserved: Vec<PathBuf>,
    buffer_size: usize,
    uploads: MultipartUploads,
}

impl LocalFs {
    /// Open a backend with a [`FileStateStore`] in `config.state_dir()`.
    ///
    /// Creates the root, state and parts directories if they are missing.
    pub fn new(config: LocalConfig) -> Result<Self, FsError> {
        let store = FileStateStore::open(config.state_dir())?;
        Self::with_state_store(config, Arc::new(store))
    }

    /// Open a backend that keeps session records in `store`.
    pub fn with_state_store(
        config: LocalConfig,
        store: Arc<dyn StateStore>,
    ) -> Result<Self, FsError> {
        let root = RootDir::new(&config.root_path, config.sub_path.as_deref())?;
        fs::create_dir_all(root.base()).map_err(|e| FsError::io("open", root.base(), e))?;
        let uploads = MultipartUploads::with_root(root.clone(), &config, store)?;
        tracing::debug!(root = %root.base().display(), "opened local backend");
        Ok(Self {
            root,
            reserved: vec![config.state_dir(), config.parts_dir()],
            buffer_size: config.effective_buffer_size(),
            uploads,
        })
    }

    /// The multipart engine, for administration beyond [`FsMultipart`](crate::FsMultipart).
    pub fn multipart(&self) -> &MultipartUploads {
        &self.uploads
    }

    /// Directory object keys resolve under.
    pub fn root(&self) -> &Path {
        self.root.base()
    }

    /// Normalize `path` and map it to disk, refusing the internal directories.
    fn resolve(&self, path: &str) -> Result<(String, PathBuf), FsError> {
        let (key, full) = self.root.resolve(path)?;
        if self.is_reserved(&full) {
            return Err(FsError::InvalidPath {
                path: path.to_owned(),
                reason: "reserved for multipart state",
            });
        }
        Ok((key, full))
    }

    fn is_reserved(&self, full: &Path) -> bool {
        self.reserved.iter().any(|dir| full.starts_with(dir))
    }
}

fn create_parent(full: &Path, operation: &'static str) -> Result<(), FsError> {
    match full.parent() {
        Some(parent) => {
            fs::create_dir_all(parent).map_err(|e| FsError::io(operation, parent, e))
        }
        None => Ok(()),
    }
}

fn file_type_of(meta: &fs::Metadata) -> FileType {
    if meta.is_dir() {
        FileType::Directory
    } else {
        FileType::File
    }
}

#[cfg(unix)]
fn permissions_of(meta: &fs::Metadata) -> Permissions {
    use std::os::unix::fs::PermissionsExt;
    Permissions::from_mode(meta.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn permissions_of(meta: &fs::Metadata) -> Permissions {
    match (meta.is_dir(), meta.permissions().readonly()) {
        (true, _) => Permissions::default_dir(),
        (false, true) => Permissions::from_mode(0o444),
        (false, false) => Permissions::default_file(),
    }
}

fn to_metadata(name: &str, meta: &fs::Metadata) -> Metadata {
    Metadata {
        name: name.to_owned(),
        file_type: file_type_of(meta),
        size: if meta.is_dir() { 0 } else { meta.len() },
        permissions: permissions_of(meta),
        modified: meta.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH),
    }
}
