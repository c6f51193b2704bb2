use async_trait::async_trait;
use common::WorkStatus;
use sea_orm::DbErr;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::{SqlWorkRepository, WorkFilter, WorkRepository};
use crate::config::DatabaseConfig;
use crate::database::init_db;
use crate::entity::work;

/// [`SqlWorkRepository`] that connects on first use.
///
/// A database that is down at startup does not stop the server: every call
/// retries the connection and schema sync until one succeeds, and reports the
/// failure as a [`DbErr`] meanwhile.
pub struct LazySqlWorkRepository {
    config: DatabaseConfig,
    inner: OnceCell<SqlWorkRepository>,
}

impl LazySqlWorkRepository {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            inner: OnceCell::new(),
        }
    }

    /// Connect now if not connected yet.
    pub async fn connect(&self) -> Result<&SqlWorkRepository, DbErr> {
        self.inner
            .get_or_try_init(|| async {
                match init_db(&self.config).await {
                    Ok(db) => {
                        info!("Database ready");
                        Ok(SqlWorkRepository::new(db))
                    }
                    Err(e) => {
                        warn!(error = %e, "Database unavailable");
                        Err(e)
                    }
                }
            })
            .await
    }
}

#[async_trait]
impl WorkRepository for LazySqlWorkRepository {
    async fn list(&self, filter: WorkFilter) -> Result<Vec<work::Model>, DbErr> {
        self.connect().await?.list(filter).await
    }

    async fn get(&self, id: i64) -> Result<Option<work::Model>, DbErr> {
        self.connect().await?.get(id).await
    }

    async fn create(&self, work: &work::Model) -> Result<work::Model, DbErr> {
        self.connect().await?.create(work).await
    }

    async fn put(&self, work: &work::Model) -> Result<(), DbErr> {
        self.connect().await?.put(work).await
    }

    async fn set_status(
        &self,
        id: i64,
        status: WorkStatus,
    ) -> Result<Option<work::Model>, DbErr> {
        self.connect().await?.set_status(id, status).await
    }

    async fn delete(&self, id: i64) -> Result<Option<work::Model>, DbErr> {
        self.connect().await?.delete(id).await
    }

    async fn increment_views(&self, id: i64) -> Result<Option<i32>, DbErr> {
        self.connect().await?.increment_views(id).await
    }

    async fn count_image_refs(&self, url_prefix: &str) -> Result<u64, DbErr> {
        self.connect().await?.count_image_refs(url_prefix).await
    }
}
