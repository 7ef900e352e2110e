//! [`FsMultipart`] over the local emulator.
//!
//! The path-carrying calls are checked against the session's recorded
//! target; abort ignores the path so a caller can always clean up.

use std::io::Read;

use tokio_util::sync::CancellationToken;

use super::LocalFs;
use crate::{
    CompletedPart, ETag, FsError, FsMultipart, MultipartUploadInfo, PartNumber, UploadId,
    UploadedPart,
};

impl FsMultipart for LocalFs {
    fn init_multipart_upload(&self, path: &str) -> Result<UploadId, FsError> {
        let (key, _) = self.resolve(path)?;
        self.uploads.init(&key)
    }

    fn upload_part(
        &self,
        path: &str,
        upload_id: &UploadId,
        part_number: PartNumber,
        reader: &mut dyn Read,
        cancel: &CancellationToken,
    ) -> Result<ETag, FsError> {
        self.uploads.ensure_target(upload_id, path)?;
        self.uploads.upload_part(upload_id, part_number, reader, cancel)
    }

    fn complete_multipart_upload(
        &self,
        path: &str,
        upload_id: &UploadId,
        parts: &[CompletedPart],
        cancel: &CancellationToken,
    ) -> Result<(), FsError> {
        self.uploads.ensure_target(upload_id, path)?;
        self.uploads.complete(upload_id, parts, cancel)
    }

    fn abort_multipart_upload(&self, path: &str, upload_id: &UploadId) -> Result<(), FsError> {
        tracing::debug!(path, upload_id = %upload_id, "abort requested");
        self.uploads.abort(upload_id)
    }

    fn list_multipart_uploads(&self) -> Result<Vec<MultipartUploadInfo>, FsError> {
        self.uploads.list_uploads()
    }

    fn list_uploaded_parts(
        &self,
        path: &str,
        upload_id: &UploadId,
    ) -> Result<Vec<UploadedPart>, FsError> {
        self.uploads.ensure_target(upload_id, path)?;
        self.uploads.list_parts(upload_id)
    }
}
