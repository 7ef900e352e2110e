//! Directory operations.

use crate::{DirEntry, FsError, Permissions};

/// Directory operations for a storage backend.
///
/// Object stores emulate directories with key prefixes; the contract is the
/// same either way.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsDir`.
pub trait FsDir: Send + Sync {
    /// List directory contents.
    ///
    /// The outer `Result` indicates whether the directory could be opened;
    /// each item's `Result` indicates whether that entry could be read.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::NotADirectory`] if the path is not a directory
    fn list(&self, path: &str) -> Result<ReadDirIter, FsError>;

    /// Create a directory and all missing parents.
    ///
    /// Idempotent: succeeds if the directory already exists.
    fn make_dir(&self, path: &str, permissions: Permissions) -> Result<(), FsError>;

    /// Remove a directory and everything under it.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    fn remove_dir(&self, path: &str) -> Result<(), FsError>;
}

/// Iterator over directory entries.
///
/// Wraps a boxed iterator so every backend can return its own listing type.
///
/// # Example
///
/// ```rust
/// use objfs::{FsDir, FsError};
///
/// fn names<B: FsDir>(backend: &B) -> Result<Vec<String>, FsError> {
///     let mut names = Vec::new();
///     for entry in backend.list("")? {
///         names.push(entry?.name);
///     }
///     Ok(names)
/// }
/// ```
pub struct ReadDirIter(Box<dyn Iterator<Item = Result<DirEntry, FsError>> + Send + 'static>);

impl ReadDirIter {
    /// Create from any compatible iterator.
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = Result<DirEntry, FsError>> + Send + 'static,
    {
        Self(Box::new(iter))
    }

    /// Create from a pre-collected vector.
    pub fn from_vec(entries: Vec<Result<DirEntry, FsError>>) -> Self {
        Self(Box::new(entries.into_iter()))
    }

    /// Collect all entries, short-circuiting on first error.
    pub fn collect_all(self) -> Result<Vec<DirEntry>, FsError> {
        self.collect()
    }
}

impl Iterator for ReadDirIter {
    type Item = Result<DirEntry, FsError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FileType;
    use std::path::PathBuf;

    fn entry(name: &str, file_type: FileType) -> DirEntry {
        DirEntry {
            name: name.into(),
            path: name.into(),
            file_type,
            size: 0,
            modified: None,
        }
    }

    #[test]
    fn read_dir_iter_from_vec() {
        let iter = ReadDirIter::from_vec(vec![
            Ok(entry("a", FileType::File)),
            Ok(entry("b", FileType::Directory)),
        ]);
        assert_eq!(iter.count(), 2);
    }

    #[test]
    fn read_dir_iter_collect_all_error() {
        let iter = ReadDirIter::from_vec(vec![
            Ok(entry("a", FileType::File)),
            Err(FsError::PermissionDenied {
                path: PathBuf::from("b"),
                operation: "list",
            }),
        ]);
        assert!(iter.collect_all().is_err());
    }

    #[test]
    fn read_dir_iter_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<ReadDirIter>();
    }
}
