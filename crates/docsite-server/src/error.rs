//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ServerError {
    #[error("Version not found: {0}")]
    VersionNotFound(String),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// Compile or transport failure from the resolver.
    #[error("Render error: {0}")]
    Resolve(#[from] docsite_site::ResolveError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Blocking task panicked or was cancelled.
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::VersionNotFound(version) => (
                StatusCode::NOT_FOUND,
                json!({"error": "Version not found", "version": version}),
            ),
            Self::PageNotFound(path) => (
                StatusCode::NOT_FOUND,
                json!({"error": "Page not found", "path": path}),
            ),
            Self::Resolve(e) => {
                tracing::error!(error = %e, "Failed to resolve content");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": e.to_string()}),
                )
            }
            Self::Serialize(e) => {
                tracing::error!(error = %e, "Failed to serialize response");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": "Internal server error"}),
                )
            }
            Self::Task(e) => {
                tracing::error!(error = %e, "Blocking task failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": "Internal server error"}),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
