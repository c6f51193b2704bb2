use axum::Json;
use axum::extract::{Multipart, State};
use common::{ImageSource, WorkStatus};
use sea_orm::SqlErr;
use tracing::{info, instrument, warn};

use crate::entity::work;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminUser;
use crate::extractors::json::AppJson;
use crate::extractors::work_id::{WorkIdPath, WorkIdQuery};
use crate::handlers::uploads::{
    StagedUpload, release_locked, release_upload, stage_upload, upload_url, uploaded_blob_name,
};
use crate::models::work::{
    MessageResponse, SubmitResponse, UpdateStatusRequest, ViewCountResponse,
    ViewRecordedResponse, WorkResponse,
};
use crate::repository::WorkFilter;
use crate::state::AppState;

const ADMIN_AUTHOR: &str = "admin";
const DEFAULT_TITLE: &str = "Untitled";
const DEFAULT_DESCRIPTION: &str = "No description";

#[utoipa::path(
    post,
    path = "/submit",
    tag = "Works",
    operation_id = "submitWork",
    summary = "Submit a work for moderation",
    description = "Public submission. Multipart fields: `title`, `description`, and either a \
        `submission-file` upload or an `image-url`; the file wins when both are sent. \
        The work is created with status `pending`.",
    request_body(content_type = "multipart/form-data", description = "Submission form"),
    responses(
        (status = 200, description = "Work created", body = SubmitResponse),
        (status = 400, description = "No image provided or file too large (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "File sent but no storage configured (NOT_CONFIGURED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn submit_work(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SubmitResponse>, AppError> {
    let form = WorkForm::read(multipart, &state).await?;
    let work = form.create(&state, Submitter::Public).await?;

    info!(id = work.id, "Work submitted");
    Ok(Json(SubmitResponse {
        message: "Work submitted successfully!".into(),
        work: work.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/admin-add",
    tag = "Works",
    operation_id = "adminAddWork",
    summary = "Add an approved work directly",
    description = "Admin-only. Multipart fields: `title`, `description`, `image-type` \
        (`file` or `url`, inferred when absent), `submission-file`, `image-url`. \
        Missing title and description default to \"Untitled\" and \"No description\". \
        The work is created with status `approved` and `addedBy` = `admin`.",
    request_body(content_type = "multipart/form-data", description = "Admin submission form"),
    responses(
        (status = 200, description = "Work created", body = SubmitResponse),
        (status = 400, description = "Invalid image type or missing image (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Missing or wrong credentials (UNAUTHORIZED)", body = ErrorBody),
        (status = 500, description = "Storage or admin account not configured (NOT_CONFIGURED)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip(state, admin, multipart), fields(admin = %admin.username))]
pub async fn admin_add_work(
    admin: AdminUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SubmitResponse>, AppError> {
    let form = WorkForm::read(multipart, &state).await?;
    let work = form.create(&state, Submitter::Admin).await?;

    info!(id = work.id, "Work added by admin");
    Ok(Json(SubmitResponse {
        message: "Content added successfully!".into(),
        work: work.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/works-public",
    tag = "Works",
    operation_id = "listPublicWorks",
    summary = "List approved works",
    description = "Approved works, newest first. Storage failures are logged and yield an \
        empty list so the public gallery never breaks.",
    responses((status = 200, description = "Approved works", body = Vec<WorkResponse>)),
)]
#[instrument(skip(state))]
pub async fn list_public_works(State(state): State<AppState>) -> Json<Vec<WorkResponse>> {
    let works = match state.works.list(WorkFilter::Public).await {
        Ok(works) => works,
        Err(e) => {
            warn!(error = %e, "Public listing failed, returning an empty gallery");
            Vec::new()
        }
    };

    Json(works.into_iter().map(WorkResponse::from).collect())
}

#[utoipa::path(
    get,
    path = "/works",
    tag = "Works",
    operation_id = "listWorks",
    summary = "List all works",
    description = "Admin-only. Every work regardless of status, newest first.",
    responses(
        (status = 200, description = "All works", body = Vec<WorkResponse>),
        (status = 401, description = "Missing or wrong credentials (UNAUTHORIZED)", body = ErrorBody),
        (status = 500, description = "Storage failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn list_works(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<WorkResponse>>, AppError> {
    let works = state.works.list(WorkFilter::All).await?;
    Ok(Json(works.into_iter().map(WorkResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/works/{id}/status",
    tag = "Moderation",
    operation_id = "updateWorkStatus",
    summary = "Approve or reject a work",
    params(("id" = i64, Path, description = "Work ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated work", body = WorkResponse),
        (status = 400, description = "Invalid status or id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Missing or wrong credentials (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Work not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip(state, admin, body), fields(admin = %admin.username))]
pub async fn update_work_status(
    admin: AdminUser,
    State(state): State<AppState>,
    WorkIdPath(id): WorkIdPath,
    AppJson(body): AppJson<UpdateStatusRequest>,
) -> Result<Json<WorkResponse>, AppError> {
    moderate(&state, id, &body).await.map(Json)
}

#[utoipa::path(
    post,
    path = "/works",
    tag = "Moderation",
    operation_id = "updateWorkStatusByQuery",
    summary = "Approve or reject a work (query-string form)",
    description = "Same as `POST /works/{id}/status`, with the id in `?id=`.",
    params(("id" = i64, Query, description = "Work ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated work", body = WorkResponse),
        (status = 400, description = "Invalid status, missing or invalid id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Missing or wrong credentials (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Work not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip(state, admin, body), fields(admin = %admin.username))]
pub async fn update_work_status_by_query(
    admin: AdminUser,
    State(state): State<AppState>,
    WorkIdQuery(id): WorkIdQuery,
    AppJson(body): AppJson<UpdateStatusRequest>,
) -> Result<Json<WorkResponse>, AppError> {
    moderate(&state, id, &body).await.map(Json)
}

#[utoipa::path(
    delete,
    path = "/works/{id}",
    tag = "Moderation",
    operation_id = "deleteWork",
    summary = "Delete a work",
    description = "Admin-only. Also removes the uploaded image when no other work uses it; \
        image cleanup failures are logged and do not fail the request.",
    params(("id" = i64, Path, description = "Work ID")),
    responses(
        (status = 200, description = "Work deleted", body = MessageResponse),
        (status = 400, description = "Invalid id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Missing or wrong credentials (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Work not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip(state, admin), fields(admin = %admin.username))]
pub async fn delete_work(
    admin: AdminUser,
    State(state): State<AppState>,
    WorkIdPath(id): WorkIdPath,
) -> Result<Json<MessageResponse>, AppError> {
    let work = state
        .works
        .delete(id)
        .await?
        .ok_or_else(AppError::work_not_found)?;

    if work.image_source == Some(ImageSource::File)
        && let Some(name) = uploaded_blob_name(&work.image_url)
    {
        release_upload(&state, &name).await;
    }

    info!(id, "Work deleted");
    Ok(Json(MessageResponse {
        message: "Work deleted successfully!".into(),
    }))
}

#[utoipa::path(
    post,
    path = "/works/{id}/view",
    tag = "Views",
    operation_id = "recordView",
    summary = "Record a view",
    params(("id" = i64, Path, description = "Work ID")),
    responses(
        (status = 200, description = "View recorded", body = ViewRecordedResponse),
        (status = 400, description = "Invalid id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Work not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn record_view(
    State(state): State<AppState>,
    WorkIdPath(id): WorkIdPath,
) -> Result<Json<ViewRecordedResponse>, AppError> {
    let views = state
        .works
        .increment_views(id)
        .await?
        .ok_or_else(AppError::work_not_found)?;

    Ok(Json(ViewRecordedResponse {
        message: "View recorded successfully!".into(),
        views,
        work_id: id,
    }))
}

#[utoipa::path(
    get,
    path = "/works/{id}/views",
    tag = "Views",
    operation_id = "getViews",
    summary = "Get the view count of a work",
    params(("id" = i64, Path, description = "Work ID")),
    responses(
        (status = 200, description = "Current view count", body = ViewCountResponse),
        (status = 400, description = "Invalid id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Work not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_views(
    State(state): State<AppState>,
    WorkIdPath(id): WorkIdPath,
) -> Result<Json<ViewCountResponse>, AppError> {
    let work = state
        .works
        .get(id)
        .await?
        .ok_or_else(AppError::work_not_found)?;

    Ok(Json(ViewCountResponse {
        views: work.views,
        work_id: id,
    }))
}

async fn moderate(
    state: &AppState,
    id: i64,
    body: &UpdateStatusRequest,
) -> Result<WorkResponse, AppError> {
    let status = body.moderation_target()?;
    let work = state
        .works
        .set_status(id, status)
        .await?
        .ok_or_else(AppError::work_not_found)?;

    info!(id, %status, "Work moderated");
    Ok(work.into())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Submitter {
    Public,
    Admin,
}

/// Fields collected from a submission form.
#[derive(Default)]
struct WorkForm {
    title: Option<String>,
    description: Option<String>,
    image_type: Option<String>,
    image_url: Option<String>,
    upload: Option<StagedUpload>,
}

impl WorkForm {
    async fn read(mut multipart: Multipart, state: &AppState) -> Result<Self, AppError> {
        let mut form = WorkForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if name == "submission-file" {
                if form.upload.is_some() {
                    continue;
                }
                form.upload = stage_upload(
                    field,
                    state.blob_store.is_some(),
                    state.config.storage.max_blob_size,
                )
                .await?;
                continue;
            }

            let slot = match name.as_str() {
                "title" => &mut form.title,
                "description" => &mut form.description,
                "image-type" => &mut form.image_type,
                "image-url" => &mut form.image_url,
                _ => continue, // Ignore unknown fields.
            };
            let text = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read '{name}': {e}")))?;
            *slot = non_blank(text);
        }

        Ok(form)
    }

    /// Validate and persist the work.
    ///
    /// The staged upload is only copied into the blob store once the form is
    /// known to be valid and the new work is going to use it.
    async fn create(
        mut self,
        state: &AppState,
        submitter: Submitter,
    ) -> Result<work::Model, AppError> {
        let (image_url, image_source) = match submitter {
            Submitter::Public => self.public_image()?,
            Submitter::Admin => self.admin_image()?,
        };
        let upload = self
            .upload
            .take()
            .filter(|_| image_source == ImageSource::File);
        let Some(upload) = upload else {
            return self.insert(state, submitter, image_url, image_source).await;
        };

        let blob_store = state
            .blob_store
            .as_deref()
            .ok_or_else(|| AppError::NotConfigured("Storage is not configured".into()))?;
        let guard = state.blob_locks.lock(upload.name().hash()).await;
        upload.commit(blob_store, &guard).await?;

        let result = self.insert(state, submitter, image_url, image_source).await;
        if result.is_err() {
            release_locked(state, blob_store, upload.name(), &guard).await;
        }
        result
    }

    async fn insert(
        self,
        state: &AppState,
        submitter: Submitter,
        image_url: String,
        image_source: ImageSource,
    ) -> Result<work::Model, AppError> {
        let (id, submitted_at) = state.ids.next();

        let model = match submitter {
            Submitter::Public => work::Model {
                id,
                title: self.title,
                description: self.description,
                image_url,
                status: WorkStatus::Pending,
                submitted_at,
                added_by: None,
                image_source: Some(image_source),
                views: 0,
            },
            Submitter::Admin => work::Model {
                id,
                title: Some(self.title.unwrap_or_else(|| DEFAULT_TITLE.into())),
                description: Some(
                    self.description
                        .unwrap_or_else(|| DEFAULT_DESCRIPTION.into()),
                ),
                image_url,
                status: WorkStatus::Approved,
                submitted_at,
                added_by: Some(ADMIN_AUTHOR.into()),
                image_source: Some(image_source),
                views: 0,
            },
        };

        state
            .works
            .create(&model)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    AppError::Conflict(format!("A work with id {id} already exists"))
                }
                _ => AppError::from(e),
            })
    }

    fn public_image(&self) -> Result<(String, ImageSource), AppError> {
        match (&self.upload, &self.image_url) {
            (Some(upload), _) => Ok((upload_url(upload.name()), ImageSource::File)),
            (None, Some(url)) => Ok((url.clone(), ImageSource::Url)),
            (None, None) => Err(AppError::Validation("File not uploaded.".into())),
        }
    }

    fn admin_image(&self) -> Result<(String, ImageSource), AppError> {
        let image_type = match self.image_type.as_deref() {
            Some(raw) => raw
                .parse::<ImageSource>()
                .map_err(|e| AppError::Validation(e.to_string()))?,
            None if self.upload.is_some() => ImageSource::File,
            None => ImageSource::Url,
        };

        match image_type {
            ImageSource::File => self
                .upload
                .as_ref()
                .map(|upload| (upload_url(upload.name()), ImageSource::File))
                .ok_or_else(|| AppError::Validation("File not uploaded.".into())),
            ImageSource::Url => self
                .image_url
                .clone()
                .map(|url| (url, ImageSource::Url))
                .ok_or_else(|| AppError::Validation("Image URL is required.".into())),
        }
    }
}

/// Text fields are stored verbatim; whitespace-only counts as absent.
fn non_blank(text: String) -> Option<String> {
    (!text.trim().is_empty()).then_some(text)
}
