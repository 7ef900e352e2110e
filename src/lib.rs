//! # objfs
//!
//! A filesystem abstraction shaped like an object store, with a local-disk
//! backend that emulates multipart uploads.
//!
//! Cloud drivers and the local backend implement the same capability set,
//! [`FileSystem`], so callers can swap one for the other without changing
//! call sites.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust
//! use objfs::{CompletedPart, FsMultipart, FsRead, LocalConfig, LocalFs, PartNumber};
//! use tokio_util::sync::CancellationToken;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let fs = LocalFs::new(LocalConfig::new(dir.path())).unwrap();
//! let cancel = CancellationToken::new();
//!
//! let id = fs.init_multipart_upload("greeting.txt").unwrap();
//! let p1 = PartNumber::new(1).unwrap();
//! let p2 = PartNumber::new(2).unwrap();
//! let tag2 = fs.upload_part("greeting.txt", &id, p2, &mut &b"World"[..], &cancel).unwrap();
//! let tag1 = fs.upload_part("greeting.txt", &id, p1, &mut &b"Hello, "[..], &cancel).unwrap();
//!
//! fs.complete_multipart_upload(
//!     "greeting.txt",
//!     &id,
//!     &[CompletedPart::new(p1, tag1), CompletedPart::new(p2, tag2)],
//!     &cancel,
//! )
//! .unwrap();
//! assert_eq!(fs.read("greeting.txt").unwrap(), b"Hello, World");
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`FileSystem`] | Full capability set: files, directories, metadata, uploads |
//! | [`LocalFs`] | Local-disk backend |
//! | [`MultipartUploads`] | The multipart emulator behind [`LocalFs`] |
//! | [`StateStore`] | Durable session records ([`FileStateStore`], [`MemoryStateStore`]) |
//! | [`FsError`] | Error type with context |
//!
//! ---
//!
//! ## Multipart Semantics
//!
//! - Parts may arrive in any order and in parallel; the completion list,
//!   not the part numbers, decides byte order.
//! - `complete` is strict: an unknown session is [`FsError::UploadNotFound`],
//!   a missing part is [`FsError::PartNotFound`] and leaves the session open.
//! - `abort` is lenient: aborting an unknown session succeeds.
//! - Sessions survive a restart when backed by [`FileStateStore`].
//!
//! ---
//!
//! ## Logging
//!
//! Operations emit [`tracing`] events and spans. The crate never installs a
//! subscriber.
//!
//! ---
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` and take `&self`. Share a backend with
//! `Arc<LocalFs>`; mutations of one upload session are serialized internally.

mod config;
mod error;
mod ext;
mod local;
mod multipart;
mod path;
mod traits;
mod types;

// Public re-exports - error types
pub use error::FsError;

// Public re-exports - core types
pub use types::{
    CompletedPart, CreateOptions, DirEntry, ETag, FileType, Metadata, MultipartUploadInfo,
    ObjectMetadata, PartNumber, Permissions, UploadId, UploadedPart,
};

// Public re-exports - capability traits
pub use traits::{
    FileSystem, Fs, FsDir, FsMetadata, FsMultipart, FsRead, FsUpload, FsWrite, ReadDirIter,
};

// Public re-exports - local backend
pub use config::{DEFAULT_BUFFER_SIZE, DEFAULT_STATE_DIR, LocalConfig, SupersededParts};
pub use local::LocalFs;
pub use multipart::{
    FileStateStore, MemoryStateStore, MultipartUploads, PartEntry, StateStore, UploadRecord,
};

// Public re-exports - infrastructure
pub use ext::FsExt;
pub use path::normalize_key;
