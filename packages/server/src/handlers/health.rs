use axum::http::StatusCode;

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "health",
    summary = "Liveness probe",
    responses((status = 200, description = "Server is running")),
)]
pub async fn health() -> StatusCode {
    StatusCode::OK
}
