//! File reads, writes and single-shot uploads.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};

use tokio_util::sync::CancellationToken;

use super::{LocalFs, create_parent, to_metadata};
use crate::multipart::{ChunkedCopy, stage_in};
use crate::path::{file_name, normalize_key};
use crate::{CreateOptions, FsError, FsMetadata, FsRead, FsUpload, FsWrite, Metadata};

impl LocalFs {
    fn apply_options(&self, path: &str, options: &CreateOptions) -> Result<(), FsError> {
        if let Some(content_type) = &options.content_type {
            tracing::debug!(path, content_type = %content_type, "content type not stored on local disk");
        }
        match &options.metadata {
            Some(metadata) => self.set_metadata(path, metadata),
            None => Ok(()),
        }
    }
}

impl FsRead for LocalFs {
    fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let (_, full) = self.resolve(path)?;
        fs::read(&full).map_err(|e| FsError::io("read", &full, e))
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, FsError> {
        let (_, full) = self.resolve(path)?;
        let file = File::open(&full).map_err(|e| FsError::io("open", &full, e))?;
        Ok(Box::new(file))
    }

    fn exists(&self, path: &str) -> Result<bool, FsError> {
        let (_, full) = self.resolve(path)?;
        match fs::metadata(&full) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(FsError::io("exists", &full, e)),
        }
    }

    fn stat(&self, path: &str) -> Result<Metadata, FsError> {
        let (key, full) = self.resolve(path)?;
        let meta = fs::metadata(&full).map_err(|e| FsError::io("stat", &full, e))?;
        Ok(to_metadata(file_name(&key), &meta))
    }
}

impl FsWrite for LocalFs {
    fn create_with_options(
        &self,
        path: &str,
        options: &CreateOptions,
    ) -> Result<Box<dyn Write + Send>, FsError> {
        let (_, full) = self.resolve(path)?;
        create_parent(&full, "create")?;
        let file = File::create(&full).map_err(|e| FsError::io("create", &full, e))?;
        self.apply_options(path, options)?;
        Ok(Box::new(file))
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let (_, full) = self.resolve(path)?;
        create_parent(&full, "write")?;
        fs::write(&full, data).map_err(|e| FsError::io("write", &full, e))
    }

    fn append(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let (_, full) = self.resolve(path)?;
        create_parent(&full, "append")?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&full)
            .and_then(|mut file| file.write_all(data))
            .map_err(|e| FsError::io("append", &full, e))
    }

    fn remove_file(&self, path: &str) -> Result<(), FsError> {
        let (_, full) = self.resolve(path)?;
        fs::remove_file(&full).map_err(|e| FsError::io("remove_file", &full, e))
    }

    fn copy(&self, from: &str, to: &str) -> Result<(), FsError> {
        let (_, src) = self.resolve(from)?;
        let (_, dst) = self.resolve(to)?;
        if !src.is_file() {
            return Err(FsError::NotFound { path: src });
        }
        create_parent(&dst, "copy")?;
        fs::copy(&src, &dst).map_err(|e| FsError::io("copy", &dst, e))?;
        Ok(())
    }

    fn move_file(&self, from: &str, to: &str) -> Result<(), FsError> {
        let (_, src) = self.resolve(from)?;
        let (_, dst) = self.resolve(to)?;
        create_parent(&dst, "move")?;
        fs::rename(&src, &dst).map_err(|e| FsError::io("move", &src, e))
    }

    fn rename(&self, path: &str, new_name: &str) -> Result<(), FsError> {
        let name = normalize_key(new_name)?;
        if name.is_empty() || name.contains('/') {
            return Err(FsError::InvalidPath {
                path: new_name.to_owned(),
                reason: "new name must be a single path component",
            });
        }
        let (key, _) = self.resolve(path)?;
        if key.is_empty() {
            return Err(FsError::InvalidPath {
                path: path.to_owned(),
                reason: "cannot rename the root",
            });
        }
        let target = match key.rsplit_once('/') {
            Some((parent, _)) => format!("{parent}/{name}"),
            None => name,
        };
        self.move_file(&key, &target)
    }
}

impl FsUpload for LocalFs {
    #[tracing::instrument(skip(self, reader, options, cancel))]
    fn upload(
        &self,
        path: &str,
        reader: &mut dyn Read,
        options: &CreateOptions,
        cancel: &CancellationToken,
    ) -> Result<(), FsError> {
        let (_, full) = self.resolve(path)?;
        let parent = full.parent().unwrap_or_else(|| self.root());
        fs::create_dir_all(parent).map_err(|e| FsError::io("upload", parent, e))?;

        let mut staged = stage_in(parent, "upload")?;
        let staged_path = staged.path().to_path_buf();
        let copier = ChunkedCopy {
            operation: "upload",
            buffer_size: self.buffer_size,
            cancel,
        };
        let size = copier.run(
            reader,
            std::path::Path::new("<upload stream>"),
            staged.as_file_mut(),
            &staged_path,
            |_| {},
        )?;
        staged
            .as_file()
            .sync_all()
            .map_err(|e| FsError::io("upload", &staged_path, e))?;
        staged.persist(&full)?;
        self.apply_options(path, options)?;

        tracing::debug!(size, "uploaded object");
        Ok(())
    }
}
