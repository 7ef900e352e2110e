//! Core types for the objfs filesystem abstraction.

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::FsError;

/// Type of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    /// Regular file (or object).
    File,
    /// Directory (or common prefix).
    Directory,
}

/// Metadata for a filesystem entry, as returned by `stat`.
#[derive(Debug, Clone)]
pub struct Metadata {
    /// Final path component.
    pub name: String,
    /// Type of the entry.
    pub file_type: FileType,
    /// Size in bytes.
    pub size: u64,
    /// Permissions. Object stores report the default for the entry type.
    pub permissions: Permissions,
    /// Last modification time.
    pub modified: SystemTime,
}

impl Metadata {
    /// Returns `true` if this is a regular file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    /// Returns `true` if this is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            name: String::new(),
            file_type: FileType::File,
            size: 0,
            permissions: Permissions::default_file(),
            modified: SystemTime::UNIX_EPOCH,
        }
    }
}

/// A directory entry returned from `list`.
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// Name of the entry (filename only, not full path).
    pub name: String,
    /// Backend-relative path to the entry.
    pub path: String,
    /// Type of the entry.
    pub file_type: FileType,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, when the backend knows it.
    pub modified: Option<SystemTime>,
}

/// Unix-style permissions stored as a mode bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permissions(u32);

impl Permissions {
    /// Create permissions from a Unix mode (e.g., 0o755).
    #[inline]
    pub const fn from_mode(mode: u32) -> Self {
        Self(mode & 0o7777)
    }

    /// Get the raw mode value.
    #[inline]
    pub const fn mode(&self) -> u32 {
        self.0
    }

    /// Returns `true` if these permissions deny writing.
    #[inline]
    pub const fn readonly(&self) -> bool {
        (self.0 & 0o222) == 0
    }

    /// Default permissions for a new file (0o644 = rw-r--r--).
    #[inline]
    pub const fn default_file() -> Self {
        Self(0o644)
    }

    /// Default permissions for a new directory (0o755 = rwxr-xr-x).
    #[inline]
    pub const fn default_dir() -> Self {
        Self(0o755)
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::default_file()
    }
}

/// Free-form object metadata.
///
/// Cloud backends map these onto vendor user-metadata headers; the local
/// backend only understands `mode`.
pub type ObjectMetadata = BTreeMap<String, serde_json::Value>;

/// Options applied when creating or uploading a file.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Content type to store with the object. Ignored by the local backend.
    pub content_type: Option<String>,
    /// Metadata to apply after the object is written.
    pub metadata: Option<ObjectMetadata>,
}

impl CreateOptions {
    /// Set the content type.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the metadata.
    pub fn metadata(mut self, metadata: ObjectMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

// =============================================================================
// Multipart Types
// =============================================================================

/// Opaque identifier of one multipart upload session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadId(String);

impl UploadId {
    /// Allocate a fresh random ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the ID as a string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UploadId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for UploadId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Caller-assigned part number. Always positive; need not be contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartNumber(NonZeroU32);

impl PartNumber {
    /// Returns `None` for zero.
    #[inline]
    pub const fn new(n: u32) -> Option<Self> {
        match NonZeroU32::new(n) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    /// The raw part number.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for PartNumber {
    type Error = FsError;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        Self::new(n).ok_or(FsError::InvalidPartNumber(n))
    }
}

impl fmt::Display for PartNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Entity tag identifying the content of one uploaded part.
pub type ETag = String;

/// One entry of the ordered list passed to `complete_multipart_upload`.
///
/// The position in the list, not the part number, decides where the part's
/// bytes land in the assembled object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedPart {
    /// Part number given to `upload_part`.
    pub part_number: PartNumber,
    /// Tag returned by `upload_part`. Empty skips the check.
    pub etag: ETag,
}

impl CompletedPart {
    /// Build a completion entry.
    pub fn new(part_number: PartNumber, etag: impl Into<ETag>) -> Self {
        Self {
            part_number,
            etag: etag.into(),
        }
    }
}

/// A part currently recorded against an open upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedPart {
    /// Part number.
    pub part_number: PartNumber,
    /// Stored size in bytes.
    pub size: u64,
    /// Entity tag of the stored bytes.
    pub etag: ETag,
}

/// Summary of an open multipart upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipartUploadInfo {
    /// Session identifier.
    pub upload_id: UploadId,
    /// Target path the upload will be assembled into.
    pub path: String,
    /// When the session was opened.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_is_file() {
        let m = Metadata {
            file_type: FileType::File,
            ..Default::default()
        };
        assert!(m.is_file());
        assert!(!m.is_dir());
    }

    #[test]
    fn metadata_is_dir() {
        let m = Metadata {
            file_type: FileType::Directory,
            ..Default::default()
        };
        assert!(!m.is_file());
        assert!(m.is_dir());
    }

    #[test]
    fn permissions_from_mode_masks_extra_bits() {
        let p = Permissions::from_mode(0o100755);
        assert_eq!(p.mode(), 0o755);
    }

    #[test]
    fn permissions_readonly() {
        assert!(Permissions::from_mode(0o444).readonly());
        assert!(!Permissions::from_mode(0o644).readonly());
    }

    #[test]
    fn part_number_rejects_zero() {
        assert!(PartNumber::new(0).is_none());
        assert!(matches!(
            PartNumber::try_from(0),
            Err(FsError::InvalidPartNumber(0))
        ));
        assert_eq!(PartNumber::try_from(3).unwrap().get(), 3);
    }

    #[test]
    fn part_numbers_order_numerically() {
        let mut parts = vec![
            PartNumber::new(10).unwrap(),
            PartNumber::new(2).unwrap(),
            PartNumber::new(1).unwrap(),
        ];
        parts.sort();
        let raw: Vec<u32> = parts.into_iter().map(PartNumber::get).collect();
        assert_eq!(raw, vec![1, 2, 10]);
    }

    #[test]
    fn upload_ids_are_unique() {
        let a = UploadId::generate();
        let b = UploadId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn completed_part_round_trips_through_json() {
        let part = CompletedPart::new(PartNumber::new(2).unwrap(), "abc");
        let json = serde_json::to_string(&part).unwrap();
        assert_eq!(json, r#"{"part_number":2,"etag":"abc"}"#);
        let back: CompletedPart = serde_json::from_str(&json).unwrap();
        assert_eq!(back, part);
    }

    #[test]
    fn types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FileType>();
        assert_send_sync::<Metadata>();
        assert_send_sync::<DirEntry>();
        assert_send_sync::<Permissions>();
        assert_send_sync::<UploadId>();
        assert_send_sync::<CompletedPart>();
        assert_send_sync::<MultipartUploadInfo>();
    }
}
