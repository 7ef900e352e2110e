//! Session open, abort and enumeration.

use std::fs;

use super::{MultipartUploads, UploadRecord};
use crate::path::normalize_key;
use crate::{FsError, MultipartUploadInfo, PartNumber, UploadId, UploadedPart};

impl MultipartUploads {
    /// Open a session targeting `path`.
    ///
    /// The target is only written by `complete`; nothing appears at `path`
    /// until then.
    #[tracing::instrument(skip(self))]
    pub fn init(&self, path: &str) -> Result<UploadId, FsError> {
        let key = normalize_key(path)?;
        if key.is_empty() {
            return Err(FsError::InvalidPath {
                path: path.to_owned(),
                reason: "multipart target must name an object",
            });
        }
        let record = UploadRecord::new(UploadId::generate(), key);
        self.store.save(&record)?;
        tracing::info!(upload_id = %record.upload_id, path = %record.path, "opened multipart upload");
        Ok(record.upload_id)
    }

    /// Close a session without producing an object.
    ///
    /// Aborting an unknown or already closed session succeeds. Blob deletion
    /// is best effort and never stops the record from being removed.
    #[tracing::instrument(skip(self), fields(upload_id = %upload_id))]
    pub fn abort(&self, upload_id: &UploadId) -> Result<(), FsError> {
        let slot = self.locks.slot(upload_id);
        let _guard = slot.lock();

        let record = match self.store.get(upload_id) {
            Ok(record) => record,
            Err(FsError::UploadNotFound { .. }) => {
                self.locks.forget(upload_id);
                tracing::debug!("abort of unknown upload");
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        for blob in record.blobs() {
            self.remove_blob(upload_id, blob);
        }
        self.store.delete(upload_id)?;
        self.locks.forget(upload_id);

        tracing::info!(path = %record.path, parts = record.parts.len(), "aborted multipart upload");
        Ok(())
    }

    /// Every open session, oldest first.
    pub fn list_uploads(&self) -> Result<Vec<MultipartUploadInfo>, FsError> {
        let mut uploads: Vec<_> = self.store.list()?.iter().map(UploadRecord::info).collect();
        uploads.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.upload_id.cmp(&b.upload_id))
        });
        Ok(uploads)
    }

    /// Parts stored against `upload_id`, by part number.
    ///
    /// Sizes come from the blobs on disk. A part whose blob has gone missing
    /// is left out of the listing.
    pub fn list_parts(&self, upload_id: &UploadId) -> Result<Vec<UploadedPart>, FsError> {
        let record = self.store.get(upload_id)?;
        let mut parts = Vec::with_capacity(record.parts.len());
        for (&number, entry) in &record.parts {
            let Some(part_number) = PartNumber::new(number) else {
                continue;
            };
            match fs::metadata(&entry.blob) {
                Ok(meta) => parts.push(UploadedPart {
                    part_number,
                    size: meta.len(),
                    etag: entry.etag.clone(),
                }),
                Err(e) => {
                    tracing::warn!(
                        upload_id = %upload_id,
                        part = number,
                        blob = %entry.blob.display(),
                        error = %e,
                        "skipping part with unreadable blob"
                    );
                }
            }
        }
        Ok(parts)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::LocalConfig;
    use crate::multipart::{MemoryStateStore, StateStore};

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
    fn init_normalizes_target() {
        let (_dir, uploads) = setup();
        let id = uploads.init("/a//b/./c.bin").unwrap();
        assert_eq!(uploads.store().get(&id).unwrap().path, "a/b/c.bin");
    }

    #[test]
    fn init_rejects_root_and_escapes() {
        let (_dir, uploads) = setup();
        assert!(matches!(uploads.init("/"), Err(FsError::InvalidPath { .. })));
        assert!(matches!(uploads.init("../x"), Err(FsError::InvalidPath { .. })));
    }

    #[test]
    fn abort_unknown_is_ok() {
        let (_dir, uploads) = setup();
        uploads.abort(&UploadId::from("never-opened")).unwrap();
        assert_eq!(uploads.locks.len(), 0);
    }

    #[test]
    fn abort_removes_blobs_and_record() {
        let (_dir, uploads) = setup();
        let cancel = CancellationToken::new();
        let id = uploads.init("x").unwrap();
        uploads.upload_part(&id, part(1), &mut &b"1"[..], &cancel).unwrap();
        uploads.upload_part(&id, part(2), &mut &b"2"[..], &cancel).unwrap();

        uploads.abort(&id).unwrap();
        assert!(uploads.store().get(&id).unwrap_err().is_upload_not_found());
        assert_eq!(fs::read_dir(uploads.parts_dir()).unwrap().count(), 0);
        uploads.abort(&id).unwrap();
    }

    #[test]
    fn list_parts_sorted_and_skips_missing_blobs() {
        let (_dir, uploads) = setup();
        let cancel = CancellationToken::new();
        let id = uploads.init("x").unwrap();
        uploads.upload_part(&id, part(3), &mut &b"ccc"[..], &cancel).unwrap();
        uploads.upload_part(&id, part(1), &mut &b"a"[..], &cancel).unwrap();
        uploads.upload_part(&id, part(2), &mut &b"bb"[..], &cancel).unwrap();

        let blob = uploads.store().get(&id).unwrap().part(part(2)).unwrap().blob.clone();
        fs::remove_file(blob).unwrap();

        let parts = uploads.list_parts(&id).unwrap();
        let summary: Vec<_> = parts.iter().map(|p| (p.part_number.get(), p.size)).collect();
        assert_eq!(summary, vec![(1, 1), (3, 3)]);
    }

    #[test]
    fn list_uploads_oldest_first() {
        let (_dir, uploads) = setup();
        let first = uploads.init("one").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = uploads.init("two").unwrap();

        let listed = uploads.list_uploads().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].upload_id, first);
        assert_eq!(listed[1].upload_id, second);
        assert_eq!(listed[1].path, "two");
    }
}
