use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use crate::error::AppError;
use crate::state::AppState;

/// Proof that the request carried valid administrator Basic-auth credentials.
///
/// Add this as a handler parameter to make the route admin-only.
pub struct AdminUser {
    pub username: String,
}

impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let verifier = state.admin.ok_or_else(|| {
            AppError::NotConfigured("Admin credentials are not configured".into())
        })?;

        let TypedHeader(Authorization(basic)) =
            TypedHeader::<Authorization<Basic>>::from_request_parts(parts, &())
                .await
                .map_err(|_| AppError::Unauthorized)?;

        if !verifier.verify(basic.username(), basic.password()) {
            tracing::warn!("Rejected admin credentials");
            return Err(AppError::Unauthorized);
        }

        Ok(AdminUser {
            username: basic.username().to_string(),
        })
    }
}
