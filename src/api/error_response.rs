//! HTTP error response handling for the API
//!
//! Domain errors become a status code plus the JSON body described by
//! [`ApiError`].

use crate::error::{ApiError, Error, ToHttpStatus};
use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// Seconds a client should wait before retrying while the service stops
const SHUTDOWN_RETRY_AFTER_SECS: &str = "30";

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            tracing::error!(error = %self, status = status_code.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %self, status = status_code.as_u16(), "request rejected");
        }

        let api_error: ApiError = self.into();

        if status_code == StatusCode::SERVICE_UNAVAILABLE {
            return (
                status_code,
                [(header::RETRY_AFTER, SHUTDOWN_RETRY_AFTER_SECS)],
                Json(api_error),
            )
                .into_response();
        }

        (status_code, Json(api_error)).into_response()
    }
}

/// Explicit error bodies built by handlers
///
/// Validation failures are the only place handlers build an [`ApiError`]
/// directly, so they answer 400.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}
