//! Error types for the console crate.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quickstart_core::AdminError;
use thiserror::Error;

/// Errors surfaced by console handlers and the server.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Failed to start the server.
    #[error("failed to start console: {0}")]
    StartupFailed(String),

    /// A classified admin error (not found, forbidden, validation, ...).
    #[error(transparent)]
    Admin(#[from] AdminError),
}

impl ConsoleError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ConsoleError::StartupFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ConsoleError::Admin(err) => {
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl From<crate::templates::ViewError> for ConsoleError {
    fn from(err: crate::templates::ViewError) -> Self {
        ConsoleError::Admin(err.into())
    }
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ConsoleError::Admin(err) => err.to_body(),
            ConsoleError::StartupFailed(message) => serde_json::json!({
                "code": status.as_u16(),
                "text_code": null,
                "category": "internal",
                "message": message,
                "metadata": {},
            }),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Request rejected");
        }

        (status, Json(serde_json::json!({ "error": body }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_error_status_mapping() {
        let err = ConsoleError::from(AdminError::invalid_form("bad"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let response = ConsoleError::from(AdminError::panel_not_found("x")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
