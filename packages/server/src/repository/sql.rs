use async_trait::async_trait;
use common::WorkStatus;
use sea_orm::sea_query::{Expr, ExprTrait, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::debug;

use super::{WorkFilter, WorkRepository};
use crate::entity::work;

/// [`WorkRepository`] over a SeaORM connection.
#[derive(Clone)]
pub struct SqlWorkRepository {
    db: DatabaseConnection,
}

impl SqlWorkRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn active_model(work: &work::Model) -> work::ActiveModel {
    work::ActiveModel {
        id: Set(work.id),
        title: Set(work.title.clone()),
        description: Set(work.description.clone()),
        image_url: Set(work.image_url.clone()),
        status: Set(work.status),
        submitted_at: Set(work.submitted_at),
        added_by: Set(work.added_by.clone()),
        image_source: Set(work.image_source),
        views: Set(work.views),
    }
}

#[async_trait]
impl WorkRepository for SqlWorkRepository {
    async fn list(&self, filter: WorkFilter) -> Result<Vec<work::Model>, DbErr> {
        let mut select = work::Entity::find();
        if filter == WorkFilter::Public {
            select = select.filter(work::Column::Status.eq(WorkStatus::Approved));
        }

        select
            .order_by_desc(work::Column::SubmittedAt)
            .order_by_desc(work::Column::Id)
            .all(&self.db)
            .await
    }

    async fn get(&self, id: i64) -> Result<Option<work::Model>, DbErr> {
        work::Entity::find_by_id(id).one(&self.db).await
    }

    async fn create(&self, work: &work::Model) -> Result<work::Model, DbErr> {
        active_model(work).insert(&self.db).await
    }

    async fn put(&self, work: &work::Model) -> Result<(), DbErr> {
        work::Entity::insert(active_model(work))
            .on_conflict(
                OnConflict::column(work::Column::Id)
                    .update_columns([
                        work::Column::Title,
                        work::Column::Description,
                        work::Column::ImageUrl,
                        work::Column::Status,
                        work::Column::SubmittedAt,
                        work::Column::AddedBy,
                        work::Column::ImageSource,
                        work::Column::Views,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn set_status(
        &self,
        id: i64,
        status: WorkStatus,
    ) -> Result<Option<work::Model>, DbErr> {
        let txn = self.db.begin().await?;

        let result = work::Entity::update_many()
            .col_expr(work::Column::Status, Expr::value(status))
            .filter(work::Column::Id.eq(id))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(None);
        }

        let updated = work::Entity::find_by_id(id).one(&txn).await?;
        txn.commit().await?;

        debug!(id, status = %status, "Updated work status");
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<Option<work::Model>, DbErr> {
        let txn = self.db.begin().await?;

        let Some(existing) = work::Entity::find_by_id(id).one(&txn).await? else {
            txn.rollback().await?;
            return Ok(None);
        };

        let result = work::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        // A concurrent delete may have won between the read and the delete.
        Ok((result.rows_affected > 0).then_some(existing))
    }

    async fn increment_views(&self, id: i64) -> Result<Option<i32>, DbErr> {
        let txn = self.db.begin().await?;

        let result = work::Entity::update_many()
            .col_expr(
                work::Column::Views,
                Expr::col(work::Column::Views).add(1),
            )
            .filter(work::Column::Id.eq(id))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(None);
        }

        let views = work::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .map(|w| w.views);
        txn.commit().await?;

        Ok(views)
    }

    async fn count_image_refs(&self, url_prefix: &str) -> Result<u64, DbErr> {
        work::Entity::find()
            .filter(work::Column::ImageUrl.starts_with(url_prefix))
            .count(&self.db)
            .await
    }
}
