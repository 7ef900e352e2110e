//! Error types for the objfs filesystem abstraction.

use std::io;
use std::path::PathBuf;

use crate::{PartNumber, UploadId};

/// Filesystem error type with contextual variants.
///
/// Multipart failures carry the upload ID (and part number where one is
/// involved) so callers can decide between retrying `complete` and aborting.
///
/// # Examples
///
/// ```rust
/// use objfs::FsError;
/// use std::path::PathBuf;
///
/// let err = FsError::NotFound { path: PathBuf::from("missing.txt") };
/// assert_eq!(err.to_string(), "not found: missing.txt");
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    // Path/File Errors
    /// Path does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Path already exists when it shouldn't.
    #[error("{operation}: already exists: {path}")]
    AlreadyExists {
        /// The path that already exists.
        path: PathBuf,
        /// The operation that failed.
        operation: &'static str,
    },

    /// Expected a directory but found something else.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The path that is not a directory.
        path: PathBuf,
    },

    /// Path is malformed or escapes the backend root.
    #[error("invalid path: {path} ({reason})")]
    InvalidPath {
        /// The offending path as given by the caller.
        path: String,
        /// Why the path was rejected.
        reason: &'static str,
    },

    // Permission/Access Errors
    /// Permission denied for operation.
    #[error("{operation}: permission denied: {path}")]
    PermissionDenied {
        /// The path where permission was denied.
        path: PathBuf,
        /// The operation that was denied.
        operation: &'static str,
    },

    // Multipart Errors
    /// The upload session is unknown: never started, or already completed or aborted.
    #[error("upload not found: {upload_id}")]
    UploadNotFound {
        /// The unknown upload ID.
        upload_id: UploadId,
    },

    /// A part listed for completion was never uploaded to the session.
    #[error("part {part_number} not found in upload {upload_id}")]
    PartNotFound {
        /// The upload the part was looked up in.
        upload_id: UploadId,
        /// The missing part number.
        part_number: PartNumber,
    },

    /// The caller-supplied entity tag does not match the stored part.
    #[error("etag mismatch for part {part_number} of upload {upload_id}: expected {expected}, got {actual}")]
    ETagMismatch {
        /// The upload the part belongs to.
        upload_id: UploadId,
        /// The part whose tag did not match.
        part_number: PartNumber,
        /// The tag recorded when the part was uploaded.
        expected: String,
        /// The tag supplied by the caller.
        actual: String,
    },

    /// Part numbers start at 1.
    #[error("invalid part number: {0}")]
    InvalidPartNumber(u32),

    // Data Errors
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    // Backend/Operation Errors
    /// The caller cancelled the operation before it finished.
    #[error("{operation}: cancelled")]
    Cancelled {
        /// The operation that was cancelled.
        operation: &'static str,
    },

    /// Operation is not supported by this backend.
    #[error("operation not supported: {operation}")]
    NotSupported {
        /// The unsupported operation.
        operation: &'static str,
    },

    /// I/O error with context.
    #[error("{operation} failed for {path}: {source}")]
    Io {
        /// The operation that failed.
        operation: &'static str,
        /// The path involved in the operation.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// Wrap an I/O error with the operation and path it happened on.
    ///
    /// Common error kinds map onto the more specific variants so callers can
    /// match on `NotFound` without digging into `io::ErrorKind`.
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => FsError::NotFound { path },
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied { path, operation },
            io::ErrorKind::AlreadyExists => FsError::AlreadyExists { path, operation },
            _ => FsError::Io {
                operation,
                path,
                source,
            },
        }
    }

    /// Returns `true` for the "session does not exist" error.
    #[inline]
    pub fn is_upload_not_found(&self) -> bool {
        matches!(self, FsError::UploadNotFound { .. })
    }
}

impl From<io::Error> for FsError {
    fn from(error: io::Error) -> Self {
        FsError::io("io", PathBuf::new(), error)
    }
}

impl From<tempfile::PersistError> for FsError {
    fn from(error: tempfile::PersistError) -> Self {
        let path = error.file.path().to_path_buf();
        FsError::io("persist", path, error.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_error_not_found_display() {
        let err = FsError::NotFound {
            path: PathBuf::from("missing"),
        };
        assert_eq!(err.to_string(), "not found: missing");
    }

    #[test]
    fn upload_not_found_display() {
        let err = FsError::UploadNotFound {
            upload_id: UploadId::from("abc"),
        };
        assert_eq!(err.to_string(), "upload not found: abc");
        assert!(err.is_upload_not_found());
    }

    #[test]
    fn part_not_found_carries_part_number() {
        let err = FsError::PartNotFound {
            upload_id: UploadId::from("abc"),
            part_number: PartNumber::new(7).unwrap(),
        };
        assert_eq!(err.to_string(), "part 7 not found in upload abc");
        assert!(!err.is_upload_not_found());
    }

    #[test]
    fn io_helper_maps_not_found_with_path() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "test");
        let err = FsError::io("open", "a/b.txt", io_err);
        match err {
            FsError::NotFound { path } => assert_eq!(path, PathBuf::from("a/b.txt")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn io_helper_maps_permission_denied() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "test");
        let err = FsError::io("write", "x", io_err);
        assert!(matches!(
            err,
            FsError::PermissionDenied {
                operation: "write",
                ..
            }
        ));
    }

    #[test]
    fn io_helper_keeps_other_kinds() {
        let io_err = io::Error::new(io::ErrorKind::Other, "disk on fire");
        let err = FsError::io("write", "x", io_err);
        assert!(matches!(err, FsError::Io { .. }));
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn from_io_already_exists() {
        let io_err = io::Error::new(io::ErrorKind::AlreadyExists, "test");
        let err = FsError::from(io_err);
        assert!(matches!(err, FsError::AlreadyExists { .. }));
    }
}
