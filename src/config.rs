//! Configuration for the local-disk backend.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default copy chunk size. Cancellation is checked once per chunk.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Name of the state directory created under the root when none is configured.
pub const DEFAULT_STATE_DIR: &str = ".multipart";

/// What happens to the previous blob when a part number is uploaded again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupersededParts {
    /// Delete the old blob as soon as the session record points at the new one.
    #[default]
    Reclaim,
    /// Leave the old blob on disk for an external collector.
    Retain,
}

/// Configuration for [`LocalFs`](crate::LocalFs).
///
/// # Example
///
/// ```rust
/// use objfs::{LocalConfig, SupersededParts};
///
/// let config: LocalConfig = serde_json::from_str(
///     r#"{ "root_path": "/srv/data", "sub_path": "tenant-a", "superseded_parts": "retain" }"#,
/// ).unwrap();
/// assert_eq!(config.superseded_parts, SupersededParts::Retain);
/// assert_eq!(config.state_dir(), std::path::PathBuf::from("/srv/data/.multipart"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Directory all object paths resolve under.
    pub root_path: PathBuf,
    /// Optional prefix inserted between the root and every object path.
    pub sub_path: Option<String>,
    /// Where session records live. Defaults to `<root_path>/.multipart`.
    pub state_dir: Option<PathBuf>,
    /// Where part blobs live. Defaults to `<state_dir>/parts`.
    pub parts_dir: Option<PathBuf>,
    /// Policy for blobs replaced by a re-upload of the same part number.
    pub superseded_parts: SupersededParts,
    /// Copy chunk size in bytes.
    pub buffer_size: usize,
}

impl LocalConfig {
    /// Configuration rooted at `root_path` with every other knob at its default.
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            ..Self::default()
        }
    }

    /// Set the sub path.
    pub fn sub_path(mut self, sub_path: impl Into<String>) -> Self {
        self.sub_path = Some(sub_path.into());
        self
    }

    /// Set the superseded-part policy.
    pub fn superseded_parts(mut self, policy: SupersededParts) -> Self {
        self.superseded_parts = policy;
        self
    }

    /// Set the copy chunk size.
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Resolved state directory.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| self.root_path.join(DEFAULT_STATE_DIR))
    }

    /// Resolved parts directory.
    pub fn parts_dir(&self) -> PathBuf {
        self.parts_dir
            .clone()
            .unwrap_or_else(|| self.state_dir().join("parts"))
    }

    pub(crate) fn effective_buffer_size(&self) -> usize {
        if self.buffer_size == 0 {
            DEFAULT_BUFFER_SIZE
        } else {
            self.buffer_size
        }
    }
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            root_path: PathBuf::from("."),
            sub_path: None,
            state_dir: None,
            parts_dir: None,
            superseded_parts: SupersededParts::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_derive_from_root() {
        let config = LocalConfig::new("/data");
        assert_eq!(config.state_dir(), PathBuf::from("/data/.multipart"));
        assert_eq!(config.parts_dir(), PathBuf::from("/data/.multipart/parts"));
        assert_eq!(config.superseded_parts, SupersededParts::Reclaim);
        assert_eq!(config.effective_buffer_size(), DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn explicit_dirs_win() {
        let config = LocalConfig {
            state_dir: Some(PathBuf::from("/state")),
            ..LocalConfig::new("/data")
        };
        assert_eq!(config.parts_dir(), PathBuf::from("/state/parts"));
    }

    #[test]
    fn zero_buffer_falls_back_to_default() {
        let config = LocalConfig::new("/data").buffer_size(0);
        assert_eq!(config.effective_buffer_size(), DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn deserializes_with_missing_fields() {
        let config: LocalConfig = serde_json::from_str(r#"{"root_path":"/x"}"#).unwrap();
        assert_eq!(config.root_path, PathBuf::from("/x"));
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
        assert!(config.sub_path.is_none());
    }
}
