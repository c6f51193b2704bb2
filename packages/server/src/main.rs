use std::sync::Arc;

use anyhow::Context;
use gallery_server::config::AppConfig;
use gallery_server::repository::LazySqlWorkRepository;
use gallery_server::state::{AppState, open_blob_store};
use gallery_server::utils::credentials::{AdminVerifier, StaticAdminCredentials};
use gallery_server::utils::blob_locks::BlobLocks;
use gallery_server::utils::work_id::WorkIdAllocator;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let works = LazySqlWorkRepository::new(config.database.clone());
    if works.connect().await.is_err() {
        warn!("Starting without a database, retrying on each request");
    }

    let blob_store = match open_blob_store(&config.storage).await {
        Ok(Some(store)) => {
            info!(backend = store.backend(), "Image storage ready");
            Some(store)
        }
        Ok(None) => {
            warn!("Image storage disabled, file uploads will be rejected");
            None
        }
        Err(e) => {
            warn!(error = %e, "Image storage unavailable, file uploads will be rejected");
            None
        }
    };

    let admin: Option<Arc<dyn AdminVerifier>> =
        match StaticAdminCredentials::from_config(&config.admin)
            .context("Invalid admin credentials")?
        {
            Some(credentials) => Some(Arc::new(credentials)),
            None => {
                warn!("No admin credentials configured, admin endpoints will return 500");
                None
            }
        };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        works: Arc::new(works),
        blob_store,
        admin,
        ids: Arc::new(WorkIdAllocator::new()),
        blob_locks: Arc::new(BlobLocks::new()),
        config,
    };

    let app = gallery_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
