use chrono::{DateTime, Utc};
use common::{ImageSource, WorkStatus};
use serde::{Deserialize, Serialize};

use crate::entity::work;
use crate::error::AppError;

/// A gallery work as returned by the API.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkResponse {
    /// Millisecond submission timestamp, unique per work.
    #[schema(example = 1714564800000_i64)]
    pub id: i64,
    #[schema(example = "Sunset")]
    pub title: Option<String>,
    pub description: Option<String>,
    /// `/uploads/...` for uploaded files, otherwise the submitted external URL.
    #[schema(example = "/uploads/9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08.png")]
    pub image_url: String,
    pub status: WorkStatus,
    pub submitted_at: DateTime<Utc>,
    /// `"admin"` for works created through admin-add.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_source: Option<ImageSource>,
    pub views: i32,
}

impl From<work::Model> for WorkResponse {
    fn from(model: work::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            image_url: model.image_url,
            status: model.status,
            submitted_at: model.submitted_at,
            added_by: model.added_by,
            image_source: model.image_source,
            views: model.views,
        }
    }
}

/// Returned by both submission paths.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubmitResponse {
    #[schema(example = "Work submitted successfully!")]
    pub message: String,
    pub work: WorkResponse,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Work deleted successfully!")]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewRecordedResponse {
    #[schema(example = "View recorded successfully!")]
    pub message: String,
    pub views: i32,
    pub work_id: i64,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewCountResponse {
    pub views: i32,
    pub work_id: i64,
}

/// Moderation decision for a work.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateStatusRequest {
    /// `approved` or `rejected`.
    #[schema(example = "approved")]
    pub status: String,
}

impl UpdateStatusRequest {
    /// The requested status, restricted to the moderation allow-list.
    pub fn moderation_target(&self) -> Result<WorkStatus, AppError> {
        self.status
            .trim()
            .parse::<WorkStatus>()
            .ok()
            .filter(WorkStatus::is_moderation_target)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Invalid status '{}'. Valid values: approved, rejected",
                    self.status
                ))
            })
    }
}
