//! Write operations.

use std::io::Write;

use crate::{CreateOptions, FsError};

/// Write operations for a storage backend.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsWrite`.
pub trait FsWrite: Send + Sync {
    /// Create (or truncate) a file and return a writer for it.
    fn create(&self, path: &str) -> Result<Box<dyn Write + Send>, FsError> {
        self.create_with_options(path, &CreateOptions::default())
    }

    /// Create (or truncate) a file, applying content type and metadata.
    ///
    /// Backends that cannot store a given option ignore it.
    fn create_with_options(
        &self,
        path: &str,
        options: &CreateOptions,
    ) -> Result<Box<dyn Write + Send>, FsError>;

    /// Write data to a file, replacing any previous contents.
    fn write(&self, path: &str, data: &[u8]) -> Result<(), FsError>;

    /// Append data to a file (creates if not exists).
    ///
    /// # Errors
    ///
    /// - [`FsError::NotSupported`] on object stores without append
    fn append(&self, path: &str, data: &[u8]) -> Result<(), FsError>;

    /// Remove a file.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the file does not exist
    fn remove_file(&self, path: &str) -> Result<(), FsError>;

    /// Copy a file.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the source does not exist
    fn copy(&self, from: &str, to: &str) -> Result<(), FsError>;

    /// Move a file to another path.
    fn move_file(&self, from: &str, to: &str) -> Result<(), FsError>;

    /// Rename an entry in place: `new_name` replaces the last path component.
    fn rename(&self, path: &str, new_name: &str) -> Result<(), FsError>;
}
