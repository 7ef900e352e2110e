//! Completion: stitch part blobs into the target object.

use std::fs::{self, File};
use std::io::ErrorKind;

use tokio_util::sync::CancellationToken;

use super::{MultipartUploads, PartEntry, stage_in};
use crate::{CompletedPart, FsError, PartNumber, UploadId};

fn unquote(etag: &str) -> &str {
    etag.trim().trim_matches('"')
}

impl MultipartUploads {
    /// Assemble the target object from `parts`, in the order given.
    ///
    /// Every listed part is checked before the destination is touched. The
    /// bytes are staged next to the target and renamed over it, so a failure
    /// leaves neither a partial object nor a closed session: the caller can
    /// upload what is missing and call `complete` again, or abort.
    ///
    /// On success the session record is deleted and every blob the session
    /// owns is removed, including parts that were uploaded but not listed.
    ///
    /// An empty `parts` list produces an empty object.
    ///
    /// # Errors
    ///
    /// - [`FsError::UploadNotFound`] if the session is not open (including a
    ///   second `complete` of the same session)
    /// - [`FsError::PartNotFound`] if a listed part was never uploaded or its
    ///   blob has since disappeared
    /// - [`FsError::ETagMismatch`] if a non-empty tag differs from the stored one
    /// - [`FsError::Cancelled`] if `cancel` fires while copying
    /// - [`FsError::Io`] on any disk failure
    #[tracing::instrument(skip(self, parts, cancel), fields(upload_id = %upload_id, parts = parts.len()))]
    pub fn complete(
        &self,
        upload_id: &UploadId,
        parts: &[CompletedPart],
        cancel: &CancellationToken,
    ) -> Result<(), FsError> {
        let slot = self.locks.slot(upload_id);
        let _guard = slot.lock();

        let record = self.locked_record(upload_id)?;
        let sources = parts
            .iter()
            .map(|listed| {
                let stored = record
                    .part(listed.part_number)
                    .ok_or_else(|| FsError::PartNotFound {
                        upload_id: upload_id.clone(),
                        part_number: listed.part_number,
                    })?;
                let given = unquote(&listed.etag);
                if !given.is_empty() && given != unquote(&stored.etag) {
                    return Err(FsError::ETagMismatch {
                        upload_id: upload_id.clone(),
                        part_number: listed.part_number,
                        expected: stored.etag.clone(),
                        actual: listed.etag.clone(),
                    });
                }
                Ok((listed.part_number, stored))
            })
            .collect::<Result<Vec<(PartNumber, &PartEntry)>, FsError>>()?;

        let target = self.root.join_key(&record.path);
        let parent = target.parent().unwrap_or_else(|| self.root.base());
        fs::create_dir_all(parent).map_err(|e| FsError::io("complete", parent, e))?;

        let mut staged = stage_in(parent, "complete")?;
        let staged_path = staged.path().to_path_buf();
        let copier = self.copier("complete", cancel);
        let mut total = 0u64;
        for &(part_number, entry) in &sources {
            // A blob removed behind our back is a missing part, not a disk error.
            let mut blob = File::open(&entry.blob).map_err(|e| match e.kind() {
                ErrorKind::NotFound => FsError::PartNotFound {
                    upload_id: upload_id.clone(),
                    part_number,
                },
                _ => FsError::io("complete", &entry.blob, e),
            })?;
            total += copier.run(
                &mut blob,
                &entry.blob,
                staged.as_file_mut(),
                &staged_path,
                |_| {},
            )?;
            tracing::debug!(blob = %entry.blob.display(), total, "appended part");
        }
        staged
            .as_file()
            .sync_all()
            .map_err(|e| FsError::io("complete", &staged_path, e))?;
        staged.persist(&target)?;

        // The object is in place; from here on nothing can fail the call.
        if let Err(err) = self.store.delete(upload_id) {
            tracing::warn!(error = %err, "failed to delete completed upload record");
        }
        self.locks.forget(upload_id);
        for blob in record.blobs() {
            self.remove_blob(upload_id, blob);
        }

        tracing::info!(path = %record.path, size = total, "completed multipart upload");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::multipart::{MemoryStateStore, StateStore};
    use crate::{LocalConfig, PartNumber};

    fn setup() -> (tempfile::TempDir, MultipartUploads) {
        let dir = tempfile::tempdir().unwrap();
        let config = LocalConfig::new(dir.path());
        let uploads = MultipartUploads::new(&config, Arc::new(MemoryStateStore::new())).unwrap();
        (dir, uploads)
    }

    fn part(n: u32) -> PartNumber {
        PartNumber::new(n).unwrap()
    }

    #[test]
    fn unquote_strips_quotes_and_whitespace() {
        assert_eq!(unquote("\"abc\""), "abc");
        assert_eq!(unquote(" abc "), "abc");
        assert_eq!(unquote(""), "");
    }

    #[test]
    fn caller_order_decides_byte_order() {
        let (dir, uploads) = setup();
        let cancel = CancellationToken::new();
        let id = uploads.init("nested/out.txt").unwrap();
        let tag2 = uploads.upload_part(&id, part(2), &mut &b"World"[..], &cancel).unwrap();
        let tag1 = uploads.upload_part(&id, part(1), &mut &b"Hello, "[..], &cancel).unwrap();

        uploads
            .complete(
                &id,
                &[CompletedPart::new(part(1), tag1), CompletedPart::new(part(2), tag2)],
                &cancel,
            )
            .unwrap();

        let bytes = fs::read(dir.path().join("nested/out.txt")).unwrap();
        assert_eq!(bytes, b"Hello, World");
        assert!(uploads.store().get(&id).unwrap_err().is_upload_not_found());
        assert_eq!(fs::read_dir(uploads.parts_dir()).unwrap().count(), 0);
    }

    #[test]
    fn missing_part_keeps_session_and_leaves_no_file() {
        let (dir, uploads) = setup();
        let cancel = CancellationToken::new();
        let id = uploads.init("out.bin").unwrap();
        uploads.upload_part(&id, part(1), &mut &b"a"[..], &cancel).unwrap();

        let err = uploads
            .complete(
                &id,
                &[CompletedPart::new(part(1), ""), CompletedPart::new(part(7), "")],
                &cancel,
            )
            .unwrap_err();
        assert!(matches!(err, FsError::PartNotFound { part_number, .. } if part_number == part(7)));
        assert!(!dir.path().join("out.bin").exists());
        assert!(uploads.store().get(&id).is_ok());
    }

    #[test]
    fn etag_mismatch_is_rejected() {
        let (_dir, uploads) = setup();
        let cancel = CancellationToken::new();
        let id = uploads.init("out.bin").unwrap();
        uploads.upload_part(&id, part(1), &mut &b"a"[..], &cancel).unwrap();

        let err = uploads
            .complete(&id, &[CompletedPart::new(part(1), "deadbeef")], &cancel)
            .unwrap_err();
        assert!(matches!(err, FsError::ETagMismatch { .. }));
        assert!(uploads.store().get(&id).is_ok());
    }

    #[test]
    fn quoted_etag_is_accepted() {
        let (dir, uploads) = setup();
        let cancel = CancellationToken::new();
        let id = uploads.init("q.bin").unwrap();
        let tag = uploads.upload_part(&id, part(1), &mut &b"q"[..], &cancel).unwrap();
        uploads
            .complete(&id, &[CompletedPart::new(part(1), format!("\"{tag}\""))], &cancel)
            .unwrap();
        assert_eq!(fs::read(dir.path().join("q.bin")).unwrap(), b"q");
    }

    #[test]
    fn unlisted_parts_are_swept() {
        let (dir, uploads) = setup();
        let cancel = CancellationToken::new();
        let id = uploads.init("out.bin").unwrap();
        uploads.upload_part(&id, part(1), &mut &b"keep"[..], &cancel).unwrap();
        uploads.upload_part(&id, part(2), &mut &b"drop"[..], &cancel).unwrap();

        uploads
            .complete(&id, &[CompletedPart::new(part(1), "")], &cancel)
            .unwrap();
        assert_eq!(fs::read(dir.path().join("out.bin")).unwrap(), b"keep");
        assert_eq!(fs::read_dir(uploads.parts_dir()).unwrap().count(), 0);
    }

    #[test]
    fn empty_part_list_creates_empty_object() {
        let (dir, uploads) = setup();
        let id = uploads.init("empty").unwrap();
        uploads.complete(&id, &[], &CancellationToken::new()).unwrap();
        assert_eq!(fs::metadata(dir.path().join("empty")).unwrap().len(), 0);
    }

    #[test]
    fn cancelled_complete_is_retryable() {
        let (dir, uploads) = setup();
        let id = uploads.init("out.bin").unwrap();
        uploads
            .upload_part(&id, part(1), &mut &b"data"[..], &CancellationToken::new())
            .unwrap();

        let cancelled = CancellationToken::new();
        cancelled.cancel();
        let err = uploads
            .complete(&id, &[CompletedPart::new(part(1), "")], &cancelled)
            .unwrap_err();
        assert!(matches!(err, FsError::Cancelled { .. }));
        assert!(!dir.path().join("out.bin").exists());

        uploads
            .complete(&id, &[CompletedPart::new(part(1), "")], &CancellationToken::new())
            .unwrap();
        assert_eq!(fs::read(dir.path().join("out.bin")).unwrap(), b"data");
    }

    #[test]
    fn unknown_sessions_do_not_accumulate_lock_slots() {
        let (_dir, uploads) = setup();
        for i in 0..100 {
            let err = uploads
                .complete(&UploadId::from(format!("gone-{i}")), &[], &CancellationToken::new())
                .unwrap_err();
            assert!(err.is_upload_not_found());
        }
        assert_eq!(uploads.locks.len(), 0);
    }

    #[test]
    fn vanished_blob_is_part_not_found() {
        let (dir, uploads) = setup();
        let cancel = CancellationToken::new();
        let id = uploads.init("out.bin").unwrap();
        uploads.upload_part(&id, part(1), &mut &b"a"[..], &cancel).unwrap();
        uploads.upload_part(&id, part(2), &mut &b"b"[..], &cancel).unwrap();
        let blob = uploads.store().get(&id).unwrap().part(part(2)).unwrap().blob.clone();
        fs::remove_file(&blob).unwrap();

        let err = uploads
            .complete(
                &id,
                &[CompletedPart::new(part(1), ""), CompletedPart::new(part(2), "")],
                &cancel,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            FsError::PartNotFound { ref upload_id, part_number }
                if *upload_id == id && part_number == part(2)
        ));
        assert!(!dir.path().join("out.bin").exists());
        assert!(uploads.store().get(&id).is_ok());
        // Only the staged object could be left over; it must not be.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn completed_object_gets_the_plain_create_mode() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, uploads) = setup();
        let id = uploads.init("out.bin").unwrap();
        uploads.complete(&id, &[], &CancellationToken::new()).unwrap();
        fs::write(dir.path().join("plain"), b"").unwrap();

        let mode = |name: &str| {
            fs::metadata(dir.path().join(name)).unwrap().permissions().mode() & 0o777
        };
        assert_eq!(mode("out.bin"), mode("plain"));
    }
}
