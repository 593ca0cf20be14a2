use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::layout::PageConfig;
use crate::storage::DocumentStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Where generated summaries are written and read back.
    pub store: Arc<dyn DocumentStore>,
    /// Page dimensions and type sizes for every generated summary.
    pub page_config: PageConfig,
}
