mod config;
mod db;
mod errors;
mod generation;
mod layout;
mod models;
mod render;
mod routes;
mod state;
mod storage;
mod submissions;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::layout::default_page_config;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::LocalDocumentStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Generated summaries live on the local filesystem
    let store = Arc::new(LocalDocumentStore::new(config.generated_dir.clone()));
    info!(
        "Uploads in {}, generated PDFs in {}",
        config.upload_dir.display(),
        store.root().display()
    );

    let page_config = default_page_config();
    info!(
        "Page config: {}x{}pt, margin {}pt",
        page_config.page_width, page_config.page_height, page_config.margin
    );

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        store,
        page_config,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
