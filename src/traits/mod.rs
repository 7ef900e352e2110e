//! # Filesystem Traits
//!
//! The capability set every backend implements.
//!
//! ## Trait Layers
//!
//! ```text
//! Core:     FsRead + FsWrite + FsDir = Fs
//!                                     ↓
//! Storage:  Fs + FsMetadata + FsUpload + FsMultipart = FileSystem
//! ```
//!
//! | Composite | Component Traits | Use Case |
//! |-----------|------------------|----------|
//! | [`Fs`] | [`FsRead`], [`FsWrite`], [`FsDir`] | Plain file I/O |
//! | [`FileSystem`] | + [`FsMetadata`], [`FsUpload`], [`FsMultipart`] | Object-store surface |
//!
//! Both composites have blanket implementations: implement the components and
//! the composite comes for free. All traits are object-safe, so a caller can
//! hold a `Box<dyn FileSystem>` and swap the local backend for a cloud driver
//! without changing call sites.
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync`. Methods take `&self`; backends use
//! interior mutability for their own state.

mod fs_dir;
mod fs_metadata;
mod fs_multipart;
mod fs_read;
mod fs_upload;
mod fs_write;

pub use fs_dir::{FsDir, ReadDirIter};
pub use fs_metadata::FsMetadata;
pub use fs_multipart::FsMultipart;
pub use fs_read::FsRead;
pub use fs_upload::FsUpload;
pub use fs_write::FsWrite;

/// Basic filesystem: reading, writing, and directory operations.
///
/// Automatically implemented for any type that implements all three
/// component traits.
///
/// # Example
///
/// ```rust
/// use objfs::{Fs, FsError, Permissions};
///
/// fn backup_file<B: Fs + ?Sized>(fs: &B, src: &str, dst_dir: &str) -> Result<(), FsError> {
///     fs.make_dir(dst_dir, Permissions::default_dir())?;
///     let name = src.rsplit('/').next().unwrap_or(src);
///     fs.copy(src, &format!("{dst_dir}/{name}"))
/// }
/// ```
pub trait Fs: FsRead + FsWrite + FsDir {}

impl<T: FsRead + FsWrite + FsDir> Fs for T {}

/// The full object-storage capability set.
///
/// This is the interface the local backend and every cloud driver share.
pub trait FileSystem: Fs + FsMetadata + FsUpload + FsMultipart {}

impl<T: Fs + FsMetadata + FsUpload + FsMultipart> FileSystem for T {}
