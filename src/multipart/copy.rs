//! Chunked, cancellable byte copies and the staged files they land in.

use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

use crate::FsError;

/// Settings shared by every copy an operation performs.
pub(crate) struct ChunkedCopy<'a> {
    pub(crate) operation: &'static str,
    pub(crate) buffer_size: usize,
    pub(crate) cancel: &'a CancellationToken,
}

impl ChunkedCopy<'_> {
    /// Copy `reader` into `writer` one chunk at a time.
    ///
    /// The cancellation token is checked before every chunk; `inspect` sees
    /// every chunk that was written. Returns the number of bytes copied.
    pub(crate) fn run(
        &self,
        reader: &mut dyn Read,
        source: &Path,
        writer: &mut dyn Write,
        destination: &Path,
        mut inspect: impl FnMut(&[u8]),
    ) -> Result<u64, FsError> {
        let operation = self.operation;
        let cancel = self.cancel;
        let mut buf = vec![0u8; self.buffer_size.max(1)];
        let mut copied = 0u64;
        loop {
            if cancel.is_cancelled() {
                return Err(FsError::Cancelled { operation });
            }
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(FsError::io(operation, source, e)),
            };
            writer
                .write_all(&buf[..n])
                .map_err(|e| FsError::io(operation, destination, e))?;
            inspect(&buf[..n]);
            copied += n as u64;
        }
        writer
            .flush()
            .map_err(|e| FsError::io(operation, destination, e))?;
        Ok(copied)
    }
}

/// Create a temp file in `dir` that will be renamed over a public object.
///
/// The file is created with the mode a plain `fs::write` would use (0666
/// less the umask) instead of tempfile's private 0600.
pub(crate) fn stage_in(dir: &Path, operation: &'static str) -> Result<NamedTempFile, FsError> {
    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder
        .tempfile_in(dir)
        .map_err(|e| FsError::io(operation, dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn copier(buffer_size: usize, cancel: &CancellationToken) -> ChunkedCopy<'_> {
        ChunkedCopy {
            operation: "upload_part",
            buffer_size,
            cancel,
        }
    }

    #[test]
    fn copies_everything_in_small_chunks() {
        let data: Vec<u8> = (0..=255).cycle().take(10_000).collect();
        let cancel = CancellationToken::new();
        let mut out = Vec::new();
        let mut chunks = 0;
        let n = copier(7, &cancel)
            .run(
                &mut Cursor::new(&data),
                Path::new("src"),
                &mut out,
                Path::new("dst"),
                |_| chunks += 1,
            )
            .unwrap();
        assert_eq!(n, 10_000);
        assert_eq!(out, data);
        assert_eq!(chunks, 10_000usize.div_ceil(7));
    }

    #[test]
    fn stops_when_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut out = Vec::new();
        let err = copier(1, &cancel)
            .run(
                &mut Cursor::new(b"abc".to_vec()),
                Path::new("src"),
                &mut out,
                Path::new("dst"),
                |_| {},
            )
            .unwrap_err();
        assert!(matches!(
            err,
            FsError::Cancelled {
                operation: "upload_part"
            }
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn read_errors_surface_as_io() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(ErrorKind::Other, "boom"))
            }
        }
        let cancel = CancellationToken::new();
        let err = copier(16, &cancel)
            .run(
                &mut Broken,
                Path::new("stream"),
                &mut Vec::new(),
                Path::new("dst"),
                |_| {},
            )
            .unwrap_err();
        assert!(matches!(err, FsError::Io { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn staged_file_gets_the_plain_create_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain");
        std::fs::write(&plain, b"").unwrap();
        let staged = stage_in(dir.path(), "upload").unwrap();

        let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(staged.path()), mode(&plain));
    }
}
