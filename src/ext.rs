//! # Extension Traits
//!
//! Convenience methods every [`FsRead`] backend gets for free.
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`is_file`](FsExt::is_file) | Check if path is a regular file |
//! | [`is_dir`](FsExt::is_dir) | Check if path is a directory |
//! | [`file_size`](FsExt::file_size) | Size of a file in bytes |

use crate::{FsError, FsRead};

/// Extension methods for any backend.
///
/// # Example
///
/// ```rust
/// use objfs::{FsExt, FsError, FsRead};
///
/// fn check_paths<B: FsRead>(backend: &B) -> Result<(), FsError> {
///     if backend.is_file("config.json")? {
///         println!("Config exists!");
///     }
///     if backend.is_dir("data")? {
///         println!("Data directory exists!");
///     }
///     Ok(())
/// }
/// ```
pub trait FsExt: FsRead {
    /// Check if the path points to a regular file.
    ///
    /// Returns `Ok(false)` if the path doesn't exist (not an error).
    fn is_file(&self, path: &str) -> Result<bool, FsError> {
        match self.stat(path) {
            Ok(m) => Ok(m.is_file()),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check if the path points to a directory.
    ///
    /// Returns `Ok(false)` if the path doesn't exist (not an error).
    fn is_dir(&self, path: &str) -> Result<bool, FsError> {
        match self.stat(path) {
            Ok(m) => Ok(m.is_dir()),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Get the size of a file in bytes.
    ///
    /// # Errors
    ///
    /// Returns `FsError::NotFound` if the path doesn't exist.
    fn file_size(&self, path: &str) -> Result<u64, FsError> {
        Ok(self.stat(path)?.size)
    }
}

impl<B: FsRead + ?Sized> FsExt for B {}
