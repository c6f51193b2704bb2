use std::io::Cursor;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tracing::debug;

use super::error::StorageError;
use super::hash::ContentHash;
use super::traits::{BlobStore, BoxReader, StoredBlob};

const KEY_PREFIX: &str = "images";

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for MinIO, R2, Supabase storage and similar services.
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    #[serde(default = "default_path_style")]
    pub path_style: bool,
}

fn default_region() -> String {
    "us-east-1".into()
}

fn default_path_style() -> bool {
    true
}

/// Image store backed by an S3 bucket, one object per content hash.
pub struct S3BlobStore {
    bucket: Box<Bucket>,
    max_size: u64,
}

impl S3BlobStore {
    pub fn new(config: &S3Config, max_size: u64) -> Result<Self, StorageError> {
        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse()
                .map_err(|e| StorageError::Backend(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::new(
            config.access_key.as_deref(),
            config.secret_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(format!("invalid credentials: {e}")))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self { bucket, max_size })
    }

    fn object_key(hash: &ContentHash) -> String {
        format!("{KEY_PREFIX}/{}", hash.sharded('/'))
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn backend(&self) -> &'static str {
        "s3"
    }

    async fn put_stream(&self, reader: BoxReader) -> Result<ContentHash, StorageError> {
        let mut data = Vec::new();
        reader.take(self.max_size + 1).read_to_end(&mut data).await?;

        let actual = data.len() as u64;
        if actual > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual,
                limit: self.max_size,
            });
        }

        let hash = ContentHash::compute(&data);
        let key = Self::object_key(&hash);
        let response = self
            .bucket
            .put_object(&key, &data)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        check_status(response.status_code(), &hash)?;

        debug!(hash = %hash, key = %key, "Stored image object");
        Ok(hash)
    }

    async fn open(&self, hash: &ContentHash) -> Result<StoredBlob, StorageError> {
        let response = self
            .bucket
            .get_object(Self::object_key(hash))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        check_status(response.status_code(), hash)?;

        let data = response.bytes().to_vec();
        Ok(StoredBlob {
            size: data.len() as u64,
            reader: Box::new(Cursor::new(data)),
        })
    }

    async fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        let (_, status) = self
            .bucket
            .head_object(Self::object_key(hash))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        match status {
            404 => Ok(false),
            _ => check_status(status, hash).map(|()| true),
        }
    }

    async fn delete(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        if !self.exists(hash).await? {
            return Ok(false);
        }
        let response = self
            .bucket
            .delete_object(Self::object_key(hash))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        check_status(response.status_code(), hash)?;
        Ok(true)
    }
}

fn check_status(status: u16, hash: &ContentHash) -> Result<(), StorageError> {
    match status {
        200..=299 => Ok(()),
        404 => Err(StorageError::NotFound(hash.to_string())),
        other => Err(StorageError::Backend(format!(
            "unexpected status {other} for {hash}"
        ))),
    }
}
