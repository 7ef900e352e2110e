//! Durable session state.
//!
//! One [`UploadRecord`] per open session, keyed by [`UploadId`]. The record
//! owns its part blobs: everything listed in `parts` is deleted when the
//! session closes.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::{FsError, MultipartUploadInfo, PartNumber, UploadId};

/// A stored part: where its bytes live and what they hash to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartEntry {
    /// Temp blob holding the part's bytes.
    pub blob: PathBuf,
    /// Hex MD5 of the part's bytes.
    pub etag: String,
    /// Size in bytes at upload time.
    pub size: u64,
}

/// Persisted state of one open multipart upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    /// Session identifier.
    pub upload_id: UploadId,
    /// Normalized target key.
    pub path: String,
    /// Part number to stored part.
    pub parts: BTreeMap<u32, PartEntry>,
    /// When the session was opened.
    pub created_at: DateTime<Utc>,
    /// When a part was last registered.
    pub modified_at: DateTime<Utc>,
}

impl UploadRecord {
    /// Fresh record with no parts.
    pub fn new(upload_id: UploadId, path: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            upload_id,
            path: path.into(),
            parts: BTreeMap::new(),
            created_at: now,
            modified_at: now,
        }
    }

    /// Look up a stored part.
    pub fn part(&self, part_number: PartNumber) -> Option<&PartEntry> {
        self.parts.get(&part_number.get())
    }

    /// Register a part, returning the entry it replaced.
    pub fn insert_part(&mut self, part_number: PartNumber, entry: PartEntry) -> Option<PartEntry> {
        self.modified_at = Utc::now();
        self.parts.insert(part_number.get(), entry)
    }

    /// Every blob this session owns.
    pub fn blobs(&self) -> impl Iterator<Item = &Path> + '_ {
        self.parts.values().map(|entry| entry.blob.as_path())
    }

    /// Listing summary.
    pub fn info(&self) -> MultipartUploadInfo {
        MultipartUploadInfo {
            upload_id: self.upload_id.clone(),
            path: self.path.clone(),
            created_at: self.created_at,
        }
    }
}

/// Keyed store of [`UploadRecord`]s.
///
/// Implementations must be safe to call from many threads at once. `save`
/// must be atomic per record: a concurrent `get` sees the old record or the
/// new one, never a torn write.
pub trait StateStore: Send + Sync {
    /// Insert or replace the record for `record.upload_id`.
    fn save(&self, record: &UploadRecord) -> Result<(), FsError>;

    /// Fetch a record.
    ///
    /// # Errors
    ///
    /// - [`FsError::UploadNotFound`] if no record exists for `upload_id`
    fn get(&self, upload_id: &UploadId) -> Result<UploadRecord, FsError>;

    /// Remove a record. Removing an absent record succeeds.
    fn delete(&self, upload_id: &UploadId) -> Result<(), FsError>;

    /// All live records, in no particular order.
    fn list(&self) -> Result<Vec<UploadRecord>, FsError>;
}

// =============================================================================
// File-backed store
// =============================================================================

const RECORD_EXTENSION: &str = "json";

/// Stores each record as `<dir>/<upload_id>.json`.
///
/// Writes go to a temp file in the same directory and are renamed into
/// place, so records survive crashes whole or not at all.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, FsError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| FsError::io("open_state_store", &dir, e))?;
        Ok(Self { dir })
    }

    /// Directory holding the records.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // IDs come from callers; anything that isn't a plain token can't name a record.
    fn record_path(&self, upload_id: &UploadId) -> Option<PathBuf> {
        let id = upload_id.as_str();
        let plain = !id.is_empty()
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        plain.then(|| self.dir.join(format!("{id}.{RECORD_EXTENSION}")))
    }

    // The rename in `save` is only durable once the directory entry is.
    #[cfg(unix)]
    fn sync_dir(&self) -> Result<(), FsError> {
        fs::File::open(&self.dir)
            .and_then(|dir| dir.sync_all())
            .map_err(|e| FsError::io("save_state", &self.dir, e))
    }

    #[cfg(not(unix))]
    fn sync_dir(&self) -> Result<(), FsError> {
        Ok(())
    }

    fn not_found(upload_id: &UploadId) -> FsError {
        FsError::UploadNotFound {
            upload_id: upload_id.clone(),
        }
    }
}

impl StateStore for FileStateStore {
    fn save(&self, record: &UploadRecord) -> Result<(), FsError> {
        let path = self
            .record_path(&record.upload_id)
            .ok_or_else(|| Self::not_found(&record.upload_id))?;
        let data =
            serde_json::to_vec(record).map_err(|e| FsError::Serialization(e.to_string()))?;

        let mut staged =
            NamedTempFile::new_in(&self.dir).map_err(|e| FsError::io("save_state", &self.dir, e))?;
        staged
            .write_all(&data)
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|e| FsError::io("save_state", staged.path(), e))?;
        staged.persist(&path)?;
        self.sync_dir()
    }

    fn get(&self, upload_id: &UploadId) -> Result<UploadRecord, FsError> {
        let path = self
            .record_path(upload_id)
            .ok_or_else(|| Self::not_found(upload_id))?;
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Self::not_found(upload_id));
            }
            Err(e) => return Err(FsError::io("load_state", &path, e)),
        };
        serde_json::from_slice(&data)
            .map_err(|e| FsError::Deserialization(format!("{}: {e}", path.display())))
    }

    fn delete(&self, upload_id: &UploadId) -> Result<(), FsError> {
        let Some(path) = self.record_path(upload_id) else {
            return Ok(());
        };
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FsError::io("delete_state", &path, e)),
        }
    }

    fn list(&self) -> Result<Vec<UploadRecord>, FsError> {
        let entries =
            fs::read_dir(&self.dir).map_err(|e| FsError::io("list_state", &self.dir, e))?;

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| FsError::io("list_state", &self.dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match self.get(&UploadId::from(stem)) {
                Ok(record) => records.push(record),
                // Raced with a close, or a corrupt record: neither is listable.
                Err(FsError::UploadNotFound { .. }) => {}
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable upload record");
                }
            }
        }
        Ok(records)
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Non-durable store for tests and throwaway backends.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    records: RwLock<HashMap<UploadId, UploadRecord>>,
}

impl MemoryStateStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn save(&self, record: &UploadRecord) -> Result<(), FsError> {
        self.records
            .write()
            .insert(record.upload_id.clone(), record.clone());
        Ok(())
    }

    fn get(&self, upload_id: &UploadId) -> Result<UploadRecord, FsError> {
        self.records
            .read()
            .get(upload_id)
            .cloned()
            .ok_or_else(|| FsError::UploadNotFound {
                upload_id: upload_id.clone(),
            })
    }

    fn delete(&self, upload_id: &UploadId) -> Result<(), FsError> {
        self.records.write().remove(upload_id);
        Ok(())
    }

    fn list(&self) -> Result<Vec<UploadRecord>, FsError> {
        Ok(self.records.read().values().cloned().collect())
    }
}
