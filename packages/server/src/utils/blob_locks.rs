use std::sync::Arc;

use common::storage::ContentHash;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async lock per image hash.
///
/// Storing an upload and inserting the work that points at it happen under the
/// lock, as do counting an image's references and deleting its blob. A blob is
/// therefore never removed while a new work is about to reference it.
#[derive(Debug, Default)]
pub struct BlobLocks {
    locks: DashMap<ContentHash, Arc<Mutex<()>>>,
}

/// Held lock for one image hash. Dropping it releases the lock.
pub struct BlobGuard<'a> {
    locks: &'a BlobLocks,
    hash: ContentHash,
    guard: Option<OwnedMutexGuard<()>>,
}

impl BlobLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, hash: &ContentHash) -> BlobGuard<'_> {
        let mutex = self.locks.entry(*hash).or_default().clone();
        let guard = mutex.lock_owned().await;

        BlobGuard {
            locks: self,
            hash: *hash,
            guard: Some(guard),
        }
    }

    /// Number of hashes with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl BlobGuard<'_> {
    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }
}

impl Drop for BlobGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // Only the map's own handle left: nobody holds or waits for this hash.
        self.locks
            .locks
            .remove_if(&self.hash, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
