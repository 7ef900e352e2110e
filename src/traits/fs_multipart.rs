//! Multipart (staged) uploads.
//!
//! The shape mirrors the native multipart APIs of S3-compatible object
//! stores, so a caller can switch between a cloud backend and the local
//! emulator without changing code:
//!
//! ```text
//! init ──▶ upload_part × N (any order, any concurrency) ──▶ complete
//!                                                     └───▶ abort
//! ```
//!
//! # Example
//!
//! ```rust
//! use objfs::{CompletedPart, FsError, FsMultipart, PartNumber};
//! use tokio_util::sync::CancellationToken;
//!
//! fn upload_two_parts<B: FsMultipart + ?Sized>(fs: &B) -> Result<(), FsError> {
//!     let cancel = CancellationToken::new();
//!     let id = fs.init_multipart_upload("greeting.txt")?;
//!     let two = PartNumber::new(2).unwrap();
//!     let one = PartNumber::new(1).unwrap();
//!     let tag2 = fs.upload_part("greeting.txt", &id, two, &mut &b"World"[..], &cancel)?;
//!     let tag1 = fs.upload_part("greeting.txt", &id, one, &mut &b"Hello, "[..], &cancel)?;
//!     let parts = [CompletedPart::new(one, tag1), CompletedPart::new(two, tag2)];
//!     if let Err(err) = fs.complete_multipart_upload("greeting.txt", &id, &parts, &cancel) {
//!         fs.abort_multipart_upload("greeting.txt", &id)?;
//!         return Err(err);
//!     }
//!     Ok(())
//! }
//! ```

use std::io::Read;

use tokio_util::sync::CancellationToken;

use crate::{CompletedPart, ETag, FsError, MultipartUploadInfo, PartNumber, UploadId, UploadedPart};

/// Staged upload of one object in independently uploaded parts.
///
/// # Errors
///
/// `upload_part`, `complete_multipart_upload` and `list_uploaded_parts` fail
/// with [`FsError::UploadNotFound`] for an unknown or closed session.
/// `abort_multipart_upload` treats an unknown session as already aborted.
pub trait FsMultipart: Send + Sync {
    /// Open a session that will assemble into `path`.
    fn init_multipart_upload(&self, path: &str) -> Result<UploadId, FsError>;

    /// Store one part. Re-uploading a part number replaces the earlier part.
    ///
    /// Returns the part's entity tag, to be echoed back on completion.
    fn upload_part(
        &self,
        path: &str,
        upload_id: &UploadId,
        part_number: PartNumber,
        reader: &mut dyn Read,
        cancel: &CancellationToken,
    ) -> Result<ETag, FsError>;

    /// Assemble the listed parts, in list order, into the session's target.
    ///
    /// # Errors
    ///
    /// - [`FsError::PartNotFound`] if a listed part was never uploaded; the
    ///   session stays open
    fn complete_multipart_upload(
        &self,
        path: &str,
        upload_id: &UploadId,
        parts: &[CompletedPart],
        cancel: &CancellationToken,
    ) -> Result<(), FsError>;

    /// Discard the session and every stored part. Idempotent.
    fn abort_multipart_upload(&self, path: &str, upload_id: &UploadId) -> Result<(), FsError>;

    /// All open sessions.
    fn list_multipart_uploads(&self) -> Result<Vec<MultipartUploadInfo>, FsError>;

    /// Parts stored so far for one session, ordered by part number.
    fn list_uploaded_parts(
        &self,
        path: &str,
        upload_id: &UploadId,
    ) -> Result<Vec<UploadedPart>, FsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_multipart_is_object_safe() {
        fn _check(_: &dyn FsMultipart) {}
    }
}
