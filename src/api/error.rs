//! HTTP mapping for [`AppError`]. Every failure leaves the server as
//! `{"error": {"code", "message", "retryable", "rawOutput"?}}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::core::errors::AppError;

#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a AppError,
}

pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        AppError::Extraction(_) | AppError::NoEvents(_) | AppError::Parse { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AppError::ProviderAuth | AppError::ProviderInvalidResponse(_) | AppError::Network(_) => {
            StatusCode::BAD_GATEWAY
        }
        AppError::ProviderUnavailable(_) | AppError::ProviderRateLimited => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        AppError::ProviderTimeout => StatusCode::GATEWAY_TIMEOUT,
        AppError::Config(_) | AppError::Io(_) | AppError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::warn!(code = self.code(), error = %self, "request rejected");
        }
        (status, Json(ErrorBody { error: &self })).into_response()
    }
}
