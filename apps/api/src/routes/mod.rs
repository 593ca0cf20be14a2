pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::submissions::handlers;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.body_limit();

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/submit", post(handlers::handle_submit))
        .route("/api/pdf/:id", get(handlers::handle_get_pdf))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
