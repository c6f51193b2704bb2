use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{health, uploads, works};
use crate::state::AppState;

/// Routes mounted under `/api`.
pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let submissions = OpenApiRouter::new()
        .routes(routes!(works::submit_work))
        .routes(routes!(works::admin_add_work))
        .layer(uploads::upload_body_limit(config.storage.max_blob_size));

    OpenApiRouter::new()
        .merge(submissions)
        .routes(routes!(works::list_public_works))
        .routes(routes!(
            works::list_works,
            works::update_work_status_by_query
        ))
        .routes(routes!(works::delete_work))
        .routes(routes!(works::update_work_status))
        .routes(routes!(works::record_view))
        .routes(routes!(works::get_views))
}

/// Routes mounted at the root: stored images and the liveness probe.
pub fn root_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(uploads::serve_upload))
        .routes(routes!(health::health))
}
