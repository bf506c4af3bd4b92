//! Error types for the HTTP server.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use pagehost_core::Error as StoreError;

use super::LOGIN_PATH;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Error from the site store.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Admin route hit without a valid session.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Malformed multipart upload.
    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    /// Blocking store task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::InvalidInput(_) | StoreError::Conflict(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::ConfigParse(_) | StoreError::IoError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Unauthenticated => StatusCode::SEE_OTHER,
            Self::Multipart(err) => err.status(),
            Self::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if let Self::Unauthenticated = self {
            return Redirect::to(LOGIN_PATH).into_response();
        }

        let status = self.status();
        let body = match &self {
            Self::Store(StoreError::InvalidInput(msg) | StoreError::Conflict(msg)) => msg.clone(),
            Self::Store(StoreError::NotFound(_)) => "Not found".to_string(),
            Self::Multipart(_) => self.to_string(),
            _ => {
                tracing::error!(error = %self, "Request failed");
                "Internal server error".to_string()
            }
        };

        (status, body).into_response()
    }
}
