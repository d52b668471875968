//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use coolhub_domain::error::ListenerError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    reason: &'static str,
    id: Option<String>,
}

/// Maps [`ListenerError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(ListenerError);

impl From<ListenerError> for ApiError {
    fn from(err: ListenerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            ListenerError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ListenerError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            ListenerError::Gateway(err) => {
                tracing::warn!(error = %err, "gateway error");
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            ListenerError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        let body = ErrorBody {
            error: message,
            reason: self.0.reason(),
            id: self.0.subject().map(str::to_string),
        };

        (status, Json(body)).into_response()
    }
}
