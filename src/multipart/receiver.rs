//! Part upload.

use std::io::Read;
use std::path::Path;

use tokio_util::sync::CancellationToken;

use super::{MultipartUploads, PartEntry};
use crate::config::SupersededParts;
use crate::{ETag, FsError, PartNumber, UploadId};

impl MultipartUploads {
    /// Store `reader`'s bytes as part `part_number` of `upload_id`.
    ///
    /// Every call writes a new blob; a re-upload of the same number swaps the
    /// record over to it and, under [`SupersededParts::Reclaim`], deletes the
    /// old one. The record never points at a half-written blob: on any error
    /// the new blob is removed and the session is unchanged.
    ///
    /// Returns the hex MD5 of the stored bytes.
    ///
    /// # Errors
    ///
    /// - [`FsError::UploadNotFound`] if the session is not open
    /// - [`FsError::Cancelled`] if `cancel` fires mid-copy
    /// - [`FsError::Io`] on any disk or stream failure
    #[tracing::instrument(skip(self, reader, cancel), fields(upload_id = %upload_id, part = %part_number))]
    pub fn upload_part(
        &self,
        upload_id: &UploadId,
        part_number: PartNumber,
        reader: &mut dyn Read,
        cancel: &CancellationToken,
    ) -> Result<ETag, FsError> {
        // Fail before reading the stream if the session is unknown.
        self.store.get(upload_id)?;

        let mut blob = tempfile::Builder::new()
            .prefix(&format!("{upload_id}-{part_number}-"))
            .suffix(".part")
            .tempfile_in(&self.parts_dir)
            .map_err(|e| FsError::io("create_part", &self.parts_dir, e))?;

        let mut digest = md5::Context::new();
        let blob_path = blob.path().to_path_buf();
        let size = self.copier("upload_part", cancel).run(
            reader,
            Path::new("<part stream>"),
            blob.as_file_mut(),
            &blob_path,
            |chunk| digest.consume(chunk),
        )?;
        blob.as_file()
            .sync_all()
            .map_err(|e| FsError::io("upload_part", &blob_path, e))?;
        let etag = format!("{:x}", digest.compute());

        // Deleted on drop until `keep` below.
        let blob = blob.into_temp_path();

        let superseded = {
            let slot = self.locks.slot(upload_id);
            let _guard = slot.lock();
            let mut record = self.locked_record(upload_id)?;
            let previous = record.insert_part(
                part_number,
                PartEntry {
                    blob: blob_path.clone(),
                    etag: etag.clone(),
                    size,
                },
            );
            self.store.save(&record)?;
            blob.keep()
                .map_err(|e| FsError::io("upload_part", &blob_path, e.error))?;
            previous
        };

        tracing::debug!(size, etag = %etag, "stored part");

        if let Some(previous) = superseded {
            match self.superseded {
                SupersededParts::Reclaim if previous.blob != blob_path => {
                    self.remove_blob(upload_id, &previous.blob);
                }
                _ => {
                    tracing::debug!(blob = %previous.blob.display(), "retaining superseded part blob");
                }
            }
        }

        Ok(etag)
    }
}
