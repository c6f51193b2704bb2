use std::sync::Arc;

use common::storage::filesystem::FilesystemBlobStore;
use common::storage::s3::S3BlobStore;
use common::storage::{BlobStore, StorageError};

use crate::config::{AppConfig, StorageBackend, StorageConfig};
use crate::repository::WorkRepository;
use crate::utils::blob_locks::BlobLocks;
use crate::utils::credentials::AdminVerifier;
use crate::utils::work_id::WorkIdAllocator;

#[derive(Clone)]
pub struct AppState {
    pub works: Arc<dyn WorkRepository>,
    /// `None` when no image storage is configured; file uploads then fail with 500.
    pub blob_store: Option<Arc<dyn BlobStore>>,
    /// `None` when no administrator is configured; admin routes then fail with 500.
    pub admin: Option<Arc<dyn AdminVerifier>>,
    pub ids: Arc<WorkIdAllocator>,
    pub blob_locks: Arc<BlobLocks>,
    pub config: AppConfig,
}

/// Open the blob store selected by `storage.backend`.
pub async fn open_blob_store(
    config: &StorageConfig,
) -> Result<Option<Arc<dyn BlobStore>>, StorageError> {
    let store: Arc<dyn BlobStore> = match config.backend {
        StorageBackend::None => return Ok(None),
        StorageBackend::Filesystem => Arc::new(
            FilesystemBlobStore::new(config.path.clone(), config.max_blob_size).await?,
        ),
        StorageBackend::S3 => {
            let s3 = config.s3.as_ref().ok_or_else(|| {
                StorageError::Backend("storage.backend is s3 but [storage.s3] is missing".into())
            })?;
            Arc::new(S3BlobStore::new(s3, config.max_blob_size)?)
        }
    };
    Ok(Some(store))
}
