//! Stat-derived object metadata.
//!
//! Keys reported by `get_metadata`: `name`, `size`, `mode`, `modify_time`
//! (RFC 3339, UTC) and `is_dir`. Only `mode` is honoured by `set_metadata`,
//! as a number or an octal string such as `"0644"`.

use std::fs;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{LocalFs, permissions_of};
use crate::path::file_name;
use crate::{FsError, FsMetadata, ObjectMetadata};

fn parse_mode(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|m| u32::try_from(m).ok()),
        Value::String(s) => {
            let digits = s.trim().trim_start_matches("0o");
            u32::from_str_radix(digits, 8).ok()
        }
        _ => None,
    }
}

impl FsMetadata for LocalFs {
    fn get_metadata(&self, path: &str) -> Result<ObjectMetadata, FsError> {
        let (key, full) = self.resolve(path)?;
        let meta = fs::metadata(&full).map_err(|e| FsError::io("get_metadata", &full, e))?;

        let mut out = ObjectMetadata::new();
        out.insert("name".into(), Value::from(file_name(&key)));
        out.insert("size".into(), Value::from(meta.len()));
        out.insert("mode".into(), Value::from(permissions_of(&meta).mode()));
        if let Ok(modified) = meta.modified() {
            let modified: DateTime<Utc> = modified.into();
            out.insert("modify_time".into(), Value::from(modified.to_rfc3339()));
        }
        out.insert("is_dir".into(), Value::from(meta.is_dir()));
        Ok(out)
    }

    fn set_metadata(&self, path: &str, metadata: &ObjectMetadata) -> Result<(), FsError> {
        let (_, full) = self.resolve(path)?;
        let Some(value) = metadata.get("mode") else {
            return Ok(());
        };
        let Some(mode) = parse_mode(value) else {
            tracing::debug!(path, %value, "ignoring unparseable mode");
            return Ok(());
        };

        let mut perms = fs::metadata(&full)
            .map_err(|e| FsError::io("set_metadata", &full, e))?
            .permissions();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            perms.set_mode(mode);
        }
        #[cfg(not(unix))]
        perms.set_readonly(mode & 0o222 == 0);
        fs::set_permissions(&full, perms).map_err(|e| FsError::io("set_metadata", &full, e))
    }
}
