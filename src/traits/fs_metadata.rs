//! Object metadata operations.

use crate::{FsError, ObjectMetadata};

/// User metadata attached to stored objects.
///
/// Cloud backends store these as vendor metadata headers. Local disk has no
/// such store: it reports stat-derived fields and honours `mode` on write.
pub trait FsMetadata: Send + Sync {
    /// Read the metadata of an object.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    fn get_metadata(&self, path: &str) -> Result<ObjectMetadata, FsError>;

    /// Apply metadata to an object. Keys the backend cannot store are ignored.
    fn set_metadata(&self, path: &str, metadata: &ObjectMetadata) -> Result<(), FsError>;
}
