use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::server::handlers::{
    batch_handler, clean_api_handler, clean_form_handler, health_handler, home_handler,
};
use crate::server::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let body_limit = state.settings.server.max_upload_bytes();

    Router::new()
        .route("/", get(home_handler))
        .route("/clean", post(clean_form_handler))
        .route("/api/clean", post(clean_api_handler))
        .route("/batch", post(batch_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(trace_layer)
        .with_state(state)
}
