//! Custom-handler invocations for the blob-triggered functions.
//!
//! The Functions host POSTs one JSON document per trigger to
//! `/<FunctionName>` and expects a JSON reply listing outputs, log lines,
//! and a return value. A non-2xx reply marks the invocation as failed.

use std::convert::Infallible;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use cirrus_core::BlobUploadEvent;

use super::AppState;
use crate::error::ServerError;

/// Binding name of the uploaded blob for `MyFirstBlobFunction`.
pub const METADATA_BLOB_ARG: &str = "myblob";

/// Binding name of the uploaded blob for `ReadFileBlobFunction`.
pub const INGEST_BLOB_ARG: &str = "readfile";

/// Invocation request sent by the Functions host.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvokeRequest {
    /// Trigger and input bindings keyed by binding name.
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub metadata: InvokeMetadata,
}

/// Trigger metadata of a blob invocation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvokeMetadata {
    /// Full blob path, e.g. `newcontainer/People.csv`.
    #[serde(default)]
    pub blob_trigger: Option<String>,
    #[serde(default)]
    pub properties: BlobProperties,
}

/// Blob properties reported with the trigger.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlobProperties {
    #[serde(default)]
    pub length: Option<u64>,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

/// Invocation reply returned to the Functions host.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvokeResponse {
    pub outputs: Map<String, Value>,
    pub logs: Vec<String>,
    pub return_value: Option<Value>,
}

impl InvokeResponse {
    fn with_logs(logs: Vec<String>) -> Self {
        Self {
            logs,
            ..Self::default()
        }
    }
}

impl InvokeRequest {
    /// Text content of the blob bound as `arg`. A missing or null binding is
    /// an empty blob.
    pub fn content(&self, arg: &str) -> Result<&str, ServerError> {
        match self.data.get(arg) {
            None | Some(Value::Null) => Ok(""),
            Some(Value::String(content)) => Ok(content),
            Some(other) => Err(ServerError::BadInvocation(format!(
                "binding '{arg}' must be a string, got {}",
                value_kind(other)
            ))),
        }
    }

    /// Build the upload event for the blob bound as `arg`.
    ///
    /// The length falls back to the size of the delivered content when the
    /// host does not report one.
    pub fn upload_event(&self, arg: &str) -> Result<BlobUploadEvent, ServerError> {
        let content = self.content(arg)?;
        let path = self.metadata.blob_trigger.clone().unwrap_or_default();
        let length = self
            .metadata
            .properties
            .length
            .unwrap_or(content.len() as u64);

        let event = BlobUploadEvent::new(path, length);
        Ok(match self.metadata.properties.last_modified {
            Some(ts) => event.with_last_modified(ts),
            None => event,
        })
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn decode(
    payload: Result<Json<InvokeRequest>, JsonRejection>,
) -> Result<InvokeRequest, ServerError> {
    payload
        .map(|Json(request)| request)
        .map_err(|e| ServerError::BadInvocation(e.body_text()))
}

/// Warn when the host invoked `function` for a path other than the one
/// configured in `[triggers]`. Returns whether the path matched.
fn check_trigger(function: &str, event: &BlobUploadEvent, expected: &str) -> bool {
    let matched = event.path == expected;
    if !matched {
        warn!(
            function,
            blob = %event.path,
            expected,
            "invoked for an unexpected blob path"
        );
    }
    matched
}

/// `POST /MyFirstBlobFunction` -- append upload metadata to the log.
pub async fn my_first_blob_function(
    State(state): State<AppState>,
    payload: Result<Json<InvokeRequest>, JsonRejection>,
) -> Result<Json<InvokeResponse>, ServerError> {
    let request = decode(payload)?;
    let event = request.upload_event(METADATA_BLOB_ARG)?;
    let _ = check_trigger("MyFirstBlobFunction", &event, &state.triggers.metadata_path);
    info!(blob = %event.path, "blob trigger invoked");

    let summary = state.metadata_log.run(&event).await?;

    let mut logs = vec![
        format!("Printing the name of the blob path: {}", event.path),
        summary.entry.to_string(),
    ];
    logs.push(match (&summary.appended, state.metadata_log.log()) {
        (Some(report), Some(log)) => format!(
            "Metadata appended to {log} (attempts: {})",
            report.attempts
        ),
        _ => "Metadata log not updated".to_owned(),
    });

    Ok(Json(InvokeResponse::with_logs(logs)))
}

/// `POST /ReadFileBlobFunction` -- parse an uploaded CSV.
pub async fn read_file_blob_function(
    State(state): State<AppState>,
    payload: Result<Json<InvokeRequest>, JsonRejection>,
) -> Result<Json<InvokeResponse>, ServerError> {
    let request = decode(payload)?;
    let event = request.upload_event(INGEST_BLOB_ARG)?;
    let _ = check_trigger("ReadFileBlobFunction", &event, &state.triggers.ingest_path);

    let content = request.content(INGEST_BLOB_ARG)?.as_bytes();
    let chunks = futures::stream::iter([Ok::<_, Infallible>(content)]);
    let count = cirrus_functions::ingest_csv_upload(&event, chunks).await?;

    Ok(Json(InvokeResponse::with_logs(vec![
        format!("Processing blob: {}", event.path),
        format!("Read {count} records"),
    ])))
}
