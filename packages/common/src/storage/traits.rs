use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::hash::ContentHash;

pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// An image opened for download.
pub struct StoredBlob {
    pub reader: BoxReader,
    pub size: u64,
}

/// Where uploaded images live.
///
/// Images are filed under the SHA-256 of their bytes, so storing the same
/// picture twice leaves a single blob behind.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Short backend name used in logs.
    fn backend(&self) -> &'static str;

    /// Copy everything `reader` yields into the store and return its digest.
    async fn put_stream(&self, reader: BoxReader) -> Result<ContentHash, StorageError>;

    /// Fails with [`StorageError::NotFound`] when nothing is filed under `hash`.
    async fn open(&self, hash: &ContentHash) -> Result<StoredBlob, StorageError>;

    async fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError>;

    /// `false` if there was nothing to remove.
    async fn delete(&self, hash: &ContentHash) -> Result<bool, StorageError>;
}
