//! Per-session mutual exclusion.
//!
//! Every mutation of a session record (part registration, complete, abort)
//! runs under that session's mutex. Distinct sessions never contend.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::UploadId;

/// Lazily created mutex per upload ID.
#[derive(Debug, Default)]
pub(crate) struct SessionLocks {
    slots: Mutex<HashMap<UploadId, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    /// The mutex guarding `upload_id`. Callers lock it and re-read the record.
    pub(crate) fn slot(&self, upload_id: &UploadId) -> Arc<Mutex<()>> {
        self.slots
            .lock()
            .entry(upload_id.clone())
            .or_default()
            .clone()
    }

    /// Drop the slot of a closed session.
    ///
    /// Threads still queued on the old mutex re-read the store after
    /// acquiring it and find the session gone.
    pub(crate) fn forget(&self, upload_id: &UploadId) {
        self.slots.lock().remove(upload_id);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_id_shares_a_slot() {
        let locks = SessionLocks::default();
        let id = UploadId::from("a");
        let first = locks.slot(&id);
        let second = locks.slot(&id);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &locks.slot(&UploadId::from("b"))));
    }

    #[test]
    fn forget_releases_the_slot() {
        let locks = SessionLocks::default();
        let id = UploadId::from("a");
        let _ = locks.slot(&id);
        assert_eq!(locks.len(), 1);
        locks.forget(&id);
        assert_eq!(locks.len(), 0);
    }
}
