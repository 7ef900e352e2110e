//! Single-shot uploads.

use std::io::Read;

use tokio_util::sync::CancellationToken;

use crate::{CreateOptions, FsError};

/// Upload a whole object from a reader in one call.
pub trait FsUpload: Send + Sync {
    /// Stream `reader` into `path`, creating parent directories as needed.
    ///
    /// Readers of `path` never observe a partially written object.
    ///
    /// # Errors
    ///
    /// - [`FsError::Cancelled`] if `cancel` fires before the copy finishes
    fn upload(
        &self,
        path: &str,
        reader: &mut dyn Read,
        options: &CreateOptions,
        cancel: &CancellationToken,
    ) -> Result<(), FsError>;
}
