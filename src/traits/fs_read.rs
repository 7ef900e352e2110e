//! Read operations.

use std::io::Read;

use crate::{FsError, Metadata};

/// Read operations for a storage backend.
///
/// Paths are backend-relative object keys using `/` as separator.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access; backends manage their own synchronization.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsRead`.
pub trait FsRead: Send + Sync {
    /// Read entire file contents as bytes.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    fn read(&self, path: &str) -> Result<Vec<u8>, FsError>;

    /// Open a file for streaming reads.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, FsError>;

    /// Check if a path exists.
    ///
    /// Returns `Ok(false)` for a missing path. Only returns an error for
    /// unexpected failures.
    fn exists(&self, path: &str) -> Result<bool, FsError>;

    /// Get metadata for a path.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    fn stat(&self, path: &str) -> Result<Metadata, FsError>;
}
