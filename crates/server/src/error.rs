use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use cirrus_core::{IngestError, MalformedUploadEvent};

/// Errors that can occur when running the Cirrus server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A blob-trigger invocation described an unusable upload.
    #[error(transparent)]
    MalformedEvent(#[from] MalformedUploadEvent),

    /// An uploaded CSV could not be ingested.
    #[error("ingest failed: {0}")]
    Ingest(#[from] IngestError),

    /// The invocation payload could not be decoded.
    #[error("bad invocation payload: {0}")]
    BadInvocation(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        // Trigger failures answer 500 so the Functions host applies its
        // retry and poison-blob policy.
        let status = match &self {
            Self::BadInvocation(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Io(_) | Self::MalformedEvent(_) | Self::Ingest(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
