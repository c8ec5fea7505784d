//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use tadohub_domain::error::TadoHubError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    detail: String,
}

/// Maps [`TadoHubError`] to an HTTP response with appropriate status code.
pub struct ApiError(TadoHubError);

impl From<TadoHubError> for ApiError {
    fn from(err: TadoHubError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, detail) = match &self.0 {
            TadoHubError::Validation(err) => {
                (StatusCode::BAD_REQUEST, "validation", err.to_string())
            }
            TadoHubError::Overlap(err) => (StatusCode::CONFLICT, "overlap", err.to_string()),
            TadoHubError::NotFound(err) => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
            TadoHubError::HomeAssistant(err) => {
                tracing::warn!(error = %err, "home assistant call failed");
                (StatusCode::BAD_GATEWAY, "home_assistant", err.to_string())
            }
            TadoHubError::Snapshot(err) => {
                tracing::error!(error = %err, "malformed snapshot");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "internal server error".to_string(),
                )
            }
            TadoHubError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error, detail })).into_response()
    }
}
