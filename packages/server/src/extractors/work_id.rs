use axum::{
    extract::{FromRequestParts, Path, Query},
    http::request::Parts,
};
use serde::Deserialize;

use crate::error::AppError;

/// Work id taken from the `{id}` path segment.
pub struct WorkIdPath(pub i64);

impl<S> FromRequestParts<S> for WorkIdPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Validation("Invalid work id".into()))?;
        Ok(WorkIdPath(id))
    }
}

#[derive(Deserialize)]
struct IdParams {
    id: Option<String>,
}

/// Work id taken from the `?id=` query parameter.
pub struct WorkIdQuery(pub i64);

impl<S> FromRequestParts<S> for WorkIdQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<IdParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        let raw = params
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Missing work id".into()))?;
        let id = raw
            .trim()
            .parse()
            .map_err(|_| AppError::Validation("Invalid work id".into()))?;
        Ok(WorkIdQuery(id))
    }
}
