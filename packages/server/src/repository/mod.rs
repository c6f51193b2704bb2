//! Durable storage for gallery works.
//!
//! Handlers only see [`WorkRepository`]; the shipped implementation is
//! [`SqlWorkRepository`], which runs on Postgres or an embedded SQLite file.
//! The server wraps it in [`LazySqlWorkRepository`] so it can start while the
//! database is still unreachable.
//! Every mutation is a single statement, so concurrent moderators and viewers
//! never lose each other's updates.

mod lazy;
mod sql;

use async_trait::async_trait;
use common::WorkStatus;
use sea_orm::DbErr;

use crate::entity::work;

pub use lazy::LazySqlWorkRepository;
pub use sql::SqlWorkRepository;

/// Which works a listing should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkFilter {
    All,
    /// Approved works only.
    Public,
}

#[async_trait]
pub trait WorkRepository: Send + Sync {
    /// Works matching `filter`, newest submission first.
    async fn list(&self, filter: WorkFilter) -> Result<Vec<work::Model>, DbErr>;

    async fn get(&self, id: i64) -> Result<Option<work::Model>, DbErr>;

    /// Insert a new work. Fails with a unique-constraint error if the id is taken.
    async fn create(&self, work: &work::Model) -> Result<work::Model, DbErr>;

    /// Insert or fully replace a work by id.
    async fn put(&self, work: &work::Model) -> Result<(), DbErr>;

    /// Set the moderation status. `None` if no work has this id.
    async fn set_status(&self, id: i64, status: WorkStatus)
    -> Result<Option<work::Model>, DbErr>;

    /// Remove a work, returning the removed record. `None` if absent.
    async fn delete(&self, id: i64) -> Result<Option<work::Model>, DbErr>;

    /// Atomically add one view. Returns the new count, `None` if absent.
    async fn increment_views(&self, id: i64) -> Result<Option<i32>, DbErr>;

    /// Number of works whose `image_url` starts with `url_prefix`.
    async fn count_image_refs(&self, url_prefix: &str) -> Result<u64, DbErr>;
}
