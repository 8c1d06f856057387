pub mod health;
pub mod http;
pub mod invoke;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use cirrus_functions::{AppendConfig, MetadataLogFunction};
use cirrus_store::BlobStore;

use crate::config::TriggersConfig;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Blob store for the metadata log (None when no connection is configured).
    pub store: Option<Arc<dyn BlobStore>>,
    /// The metadata-log blob function.
    pub metadata_log: Arc<MetadataLogFunction>,
    /// Expected trigger paths for the blob functions.
    pub triggers: Arc<TriggersConfig>,
}

impl AppState {
    pub fn new(
        store: Option<Arc<dyn BlobStore>>,
        append: AppendConfig,
        triggers: TriggersConfig,
    ) -> Self {
        Self {
            metadata_log: Arc::new(MetadataLogFunction::new(store.clone(), append)),
            store,
            triggers: Arc::new(triggers),
        }
    }
}

/// Build the Axum router.
///
/// HTTP functions live under `/api` as the Functions host forwards them;
/// blob-trigger invocations arrive at `/<FunctionName>`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/myroute",
            get(http::first_http_function).post(http::first_http_function),
        )
        .route(
            "/api/newroute",
            get(http::second_http_function).post(http::second_http_function),
        )
        .route("/MyFirstBlobFunction", post(invoke::my_first_blob_function))
        .route("/ReadFileBlobFunction", post(invoke::read_file_blob_function))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
