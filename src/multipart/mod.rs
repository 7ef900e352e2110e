//! # Local Multipart Emulation
//!
//! Reproduces the staged-upload protocol of object stores on a plain
//! filesystem:
//!
//! ```text
//! init ──▶ StateStore record (Open)
//!            │
//! upload_part ──▶ part blob in parts_dir ──▶ record.parts[n] = blob
//!            │
//! complete ──▶ concatenate blobs in caller order ──▶ rename onto target
//!            │                                      ──▶ delete record + blobs (Closed)
//! abort ─────┴──▶ delete blobs + record (Closed)
//! ```
//!
//! ## Components
//!
//! | Module | Role |
//! |--------|------|
//! | `state` | [`StateStore`]: durable record per session |
//! | `receiver` | `upload_part`: stream a part into its own blob |
//! | `reassemble` | `complete`: stitch blobs into the target |
//! | `lifecycle` | `init`, `abort`, listings |
//! | `locks` | per-session mutex serializing record mutations |
//!
//! ## Concurrency
//!
//! Parts of one session may be uploaded in parallel: the byte copy runs
//! unlocked and only the read-modify-write of the record takes the session
//! lock. `complete` and `abort` hold the lock for their whole run, so exactly
//! one of two racing closers sees the session open.
//!
//! Locks are per process. Two processes sharing a state directory are not
//! serialized against each other.

mod copy;
mod lifecycle;
mod locks;
mod reassemble;
mod receiver;
mod state;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{LocalConfig, SupersededParts};
use crate::path::{RootDir, normalize_key};
use crate::{FsError, UploadId};

use locks::SessionLocks;

pub(crate) use copy::{ChunkedCopy, stage_in};
pub use state::{FileStateStore, MemoryStateStore, PartEntry, StateStore, UploadRecord};

/// Multipart upload sessions on local disk.
///
/// Owned by [`LocalFs`](crate::LocalFs), which exposes it through
/// [`FsMultipart`](crate::FsMultipart); usable directly for administration.
pub struct MultipartUploads {
    store: Arc<dyn StateStore>,
    locks: SessionLocks,
    root: RootDir,
    parts_dir: PathBuf,
    superseded: SupersededParts,
    buffer_size: usize,
}

impl MultipartUploads {
    /// Build the emulator over `store`, assembling into `config`'s root.
    ///
    /// Creates the parts directory if it is missing.
    pub fn new(config: &LocalConfig, store: Arc<dyn StateStore>) -> Result<Self, FsError> {
        let root = RootDir::new(&config.root_path, config.sub_path.as_deref())?;
        Self::with_root(root, config, store)
    }

    pub(crate) fn with_root(
        root: RootDir,
        config: &LocalConfig,
        store: Arc<dyn StateStore>,
    ) -> Result<Self, FsError> {
        let parts_dir = config.parts_dir();
        std::fs::create_dir_all(&parts_dir)
            .map_err(|e| FsError::io("create_parts_dir", &parts_dir, e))?;
        Ok(Self {
            store,
            locks: SessionLocks::default(),
            root,
            parts_dir,
            superseded: config.superseded_parts,
            buffer_size: config.effective_buffer_size(),
        })
    }

    /// The backing state store.
    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    /// Directory part blobs are written to.
    pub fn parts_dir(&self) -> &Path {
        &self.parts_dir
    }

    /// Fail with `UploadNotFound` unless `upload_id` is open and targets `path`.
    ///
    /// Object stores bind an upload ID to its key; a mismatch is answered as
    /// if the upload did not exist.
    pub fn ensure_target(&self, upload_id: &UploadId, path: &str) -> Result<(), FsError> {
        let record = self.store.get(upload_id)?;
        if record.path != normalize_key(path)? {
            return Err(FsError::UploadNotFound {
                upload_id: upload_id.clone(),
            });
        }
        Ok(())
    }

    // Call with the session's slot held. A closed session gives its slot back.
    fn locked_record(&self, upload_id: &UploadId) -> Result<UploadRecord, FsError> {
        self.store.get(upload_id).inspect_err(|err| {
            if err.is_upload_not_found() {
                self.locks.forget(upload_id);
            }
        })
    }

    fn copier<'a>(&self, operation: &'static str, cancel: &'a CancellationToken) -> ChunkedCopy<'a> {
        ChunkedCopy {
            operation,
            buffer_size: self.buffer_size,
            cancel,
        }
    }

    // Best effort: a failed delete is a leak, never an error for the caller.
    fn remove_blob(&self, upload_id: &UploadId, blob: &Path) {
        match std::fs::remove_file(blob) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    upload_id = %upload_id,
                    blob = %blob.display(),
                    error = %e,
                    "failed to remove part blob"
                );
            }
        }
    }
}

impl std::fmt::Debug for MultipartUploads {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultipartUploads")
            .field("root", &self.root.base())
            .field("parts_dir", &self.parts_dir)
            .field("superseded", &self.superseded)
            .field("buffer_size", &self.buffer_size)
            .finish_non_exhaustive()
    }
}
