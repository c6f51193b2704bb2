use std::path::{Path, PathBuf};

use axum::body::{Body, Bytes};
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{self, DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::storage::{BlobName, BlobStore, ContentHash};
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;
use crate::utils::blob_locks::BlobGuard;

/// Public URL prefix of stored images.
pub const UPLOADS_PREFIX: &str = "/uploads/";

/// Room for the text fields that accompany an image in a submission form.
const FORM_OVERHEAD: usize = 1024 * 1024;

pub fn upload_body_limit(max_blob_size: u64) -> DefaultBodyLimit {
    let max = usize::try_from(max_blob_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(max.saturating_add(FORM_OVERHEAD))
}

pub fn upload_url(name: &BlobName) -> String {
    format!("{UPLOADS_PREFIX}{name}")
}

/// The stored blob behind an `/uploads/...` URL, if the URL is one of ours.
pub fn uploaded_blob_name(image_url: &str) -> Option<BlobName> {
    image_url
        .strip_prefix(UPLOADS_PREFIX)
        .and_then(|name| BlobName::parse(name).ok())
}

#[utoipa::path(
    get,
    path = "/uploads/{name}",
    tag = "Uploads",
    operation_id = "getUpload",
    summary = "Download a stored image",
    description = "Streams an uploaded image. Names are content-addressed, so responses are \
        immutable and carry a strong ETag; `If-None-Match` is honoured with 304.",
    params(("name" = String, Path, description = "`{sha256}` or `{sha256}.{ext}`")),
    responses(
        (status = 200, description = "Image content"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn serve_upload(
    State(state): State<AppState>,
    extract::Path(name): extract::Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let name = BlobName::parse(&name)?;
    let blob_store = state
        .blob_store
        .as_deref()
        .ok_or_else(|| AppError::NotFound("Image not found".into()))?;

    let etag_value = format!("\"{}\"", name.hash());
    if etag_matches(&headers, &etag_value) {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag_value)]).into_response());
    }

    let blob = blob_store.open(name.hash()).await?;
    let body = Body::from_stream(ReaderStream::new(blob.reader));

    let content_type = mime_guess::from_path(name.file_name()).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_LENGTH, blob.size.to_string())
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

fn etag_matches(headers: &HeaderMap, etag_value: &str) -> bool {
    let Some(value) = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    value.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag_value
    })
}

/// An uploaded file kept on local disk until the form around it has been
/// validated. Nothing reaches the blob store before [`StagedUpload::commit`].
pub struct StagedUpload {
    path: PathBuf,
    name: BlobName,
    size: u64,
}

impl StagedUpload {
    pub fn name(&self) -> &BlobName {
        &self.name
    }

    /// Copy the staged bytes into the blob store.
    ///
    /// Takes the blob's lock guard so the caller keeps the hash locked until the
    /// work that references it is inserted.
    pub async fn commit(
        &self,
        blob_store: &dyn BlobStore,
        held: &BlobGuard<'_>,
    ) -> Result<(), AppError> {
        debug_assert_eq!(held.hash(), self.name.hash());

        let file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen staged upload: {e}")))?;
        let hash = blob_store.put_stream(Box::new(file)).await?;
        if hash != *self.name.hash() {
            return Err(AppError::Internal(format!(
                "Stored upload hashed to {hash}, expected {}",
                self.name.hash()
            )));
        }

        debug!(blob = %self.name, size = self.size, backend = blob_store.backend(), "Stored upload");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn detached(name: BlobName) -> Self {
        Self {
            path: PathBuf::new(),
            name,
            size: 0,
        }
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        // Best effort.
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Buffer one multipart file field to a temporary file, hashing as it goes.
///
/// Returns `Ok(None)` for an empty field, which is what browsers send for a
/// file input left blank. Storage only has to be configured once real content
/// shows up.
pub async fn stage_upload(
    mut field: Field<'_>,
    storage_configured: bool,
    max_size: u64,
) -> Result<Option<StagedUpload>, AppError> {
    let file_name = field.file_name().map(str::to_owned);

    let first = loop {
        match field.chunk().await.map_err(read_error)? {
            None => return Ok(None),
            Some(chunk) if chunk.is_empty() => continue,
            Some(chunk) => break chunk,
        }
    };

    if !storage_configured {
        return Err(AppError::NotConfigured("Storage is not configured".into()));
    }

    let path = std::env::temp_dir().join(format!("gallery-upload-{}", Uuid::new_v4()));
    match write_staged(&path, first, &mut field, max_size).await {
        Ok((hash, size)) => Ok(Some(StagedUpload {
            path,
            name: BlobName::new(hash, file_name.as_deref()),
            size,
        })),
        Err(e) => {
            let _ = tokio::fs::remove_file(&path).await;
            Err(e)
        }
    }
}

async fn write_staged(
    path: &Path,
    first: Bytes,
    field: &mut Field<'_>,
    max_size: u64,
) -> Result<(ContentHash, u64), AppError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;
    let mut hasher = Sha256::new();
    let mut size: u64 = 0;
    let mut next = Some(first);

    while let Some(chunk) = next {
        size += chunk.len() as u64;
        if size > max_size {
            return Err(AppError::Validation(format!(
                "File exceeds maximum size of {max_size} bytes"
            )));
        }
        hasher.update(&chunk);
        file.write_all(&chunk)
            .await
            .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;

        next = field.chunk().await.map_err(read_error)?;
    }

    file.flush()
        .await
        .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;

    Ok((ContentHash::from(hasher), size))
}

fn read_error(e: MultipartError) -> AppError {
    AppError::Validation(format!("Upload read error: {e}"))
}

/// Delete an uploaded blob unless some work still points at it.
pub async fn release_upload(state: &AppState, name: &BlobName) {
    let Some(blob_store) = state.blob_store.as_deref() else {
        return;
    };
    let guard = state.blob_locks.lock(name.hash()).await;
    release_locked(state, blob_store, name, &guard).await;
}

/// [`release_upload`] for a caller already holding the blob's lock.
///
/// Identical images share one blob, so every extension variant of the hash
/// counts as a reference. Failures are logged and swallowed.
pub async fn release_locked(
    state: &AppState,
    blob_store: &dyn BlobStore,
    name: &BlobName,
    held: &BlobGuard<'_>,
) {
    debug_assert_eq!(held.hash(), name.hash());

    let prefix = format!("{UPLOADS_PREFIX}{}", name.hash());
    match state.works.count_image_refs(&prefix).await {
        Ok(0) => match blob_store.delete(name.hash()).await {
            Ok(removed) => debug!(blob = %name, removed, "Released upload"),
            Err(e) => warn!(blob = %name, error = %e, "Failed to delete upload"),
        },
        Ok(refs) => debug!(blob = %name, refs, "Upload still referenced, keeping blob"),
        Err(e) => warn!(blob = %name, error = %e, "Could not count upload references"),
    }
}
