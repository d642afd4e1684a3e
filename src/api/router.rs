use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::AppState;

/// Builds the full application router. The body limit comes from
/// `max_upload_bytes` and covers every route.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    let api = Router::new()
        .route("/chronology/generate", post(endpoints::chronology::generate))
        .route(
            "/chronology/generate-text",
            post(endpoints::chronology::generate_text),
        )
        .route("/chronology/download", post(endpoints::chronology::download));

    Router::new()
        .route("/", get(endpoints::page::upload_page))
        .route("/health", get(endpoints::health::check))
        .nest("/api/v1", api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
