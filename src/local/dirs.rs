//! Directory listing and management.

use std::fs;

use super::{LocalFs, file_type_of};
use crate::{DirEntry, FsDir, FsError, Permissions, ReadDirIter};

impl FsDir for LocalFs {
    fn list(&self, path: &str) -> Result<ReadDirIter, FsError> {
        let (key, full) = self.resolve(path)?;
        let meta = fs::metadata(&full).map_err(|e| FsError::io("list", &full, e))?;
        if !meta.is_dir() {
            return Err(FsError::NotADirectory { path: full });
        }

        let reader = fs::read_dir(&full).map_err(|e| FsError::io("list", &full, e))?;
        let mut entries = Vec::new();
        for entry in reader {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    entries.push(Err(FsError::io("list", &full, e)));
                    continue;
                }
            };
            let entry_path = entry.path();
            if self.is_reserved(&entry_path) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let item = entry
                .metadata()
                .map(|meta| DirEntry {
                    path: if key.is_empty() {
                        name.clone()
                    } else {
                        format!("{key}/{name}")
                    },
                    file_type: file_type_of(&meta),
                    size: if meta.is_dir() { 0 } else { meta.len() },
                    modified: meta.modified().ok(),
                    name,
                })
                .map_err(|e| FsError::io("list", &entry_path, e));
            entries.push(item);
        }
        entries.sort_by(|a, b| match (a, b) {
            (Ok(a), Ok(b)) => a.name.cmp(&b.name),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => std::cmp::Ordering::Equal,
        });
        Ok(ReadDirIter::from_vec(entries))
    }

    fn make_dir(&self, path: &str, permissions: Permissions) -> Result<(), FsError> {
        let (_, full) = self.resolve(path)?;
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(permissions.mode());
        }
        #[cfg(not(unix))]
        let _ = permissions;
        builder
            .create(&full)
            .map_err(|e| FsError::io("make_dir", &full, e))
    }

    fn remove_dir(&self, path: &str) -> Result<(), FsError> {
        let (key, full) = self.resolve(path)?;
        if key.is_empty() {
            return Err(FsError::InvalidPath {
                path: path.to_owned(),
                reason: "cannot remove the root",
            });
        }
        let meta = fs::metadata(&full).map_err(|e| FsError::io("remove_dir", &full, e))?;
        if !meta.is_dir() {
            return Err(FsError::NotADirectory { path: full });
        }
        fs::remove_dir_all(&full).map_err(|e| FsError::io("remove_dir", &full, e))
    }
}
