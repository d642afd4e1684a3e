use axum::Json;

use crate::core::{config::APP_VERSION, types::HealthResponse};

/// `GET /health`: liveness only, never touches the model provider.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: APP_VERSION.to_string(),
    })
}
