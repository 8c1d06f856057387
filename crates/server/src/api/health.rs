use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use super::AppState;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Blob store backend, or `"none"` when appends are disabled.
    pub store: String,
}

/// `GET /health` -- returns service status and the active store backend.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = HealthResponse {
        status: "ok".into(),
        store: state
            .store
            .as_ref()
            .map_or_else(|| "none".to_owned(), |store| store.backend().to_owned()),
    };

    (StatusCode::OK, Json(body))
}
