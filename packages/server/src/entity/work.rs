use common::{ImageSource, WorkStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "works")]
pub struct Model {
    /// Millisecond submission timestamp, made unique at allocation time.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,

    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: String,
    pub status: WorkStatus,

    /// Set once at creation.
    pub submitted_at: DateTimeUtc,

    /// `"admin"` for works created through the admin-add path.
    pub added_by: Option<String>,
    pub image_source: Option<ImageSource>,

    #[sea_orm(default_value = 0)]
    pub views: i32,
}

impl ActiveModelBehavior for ActiveModel {}
