use std::sync::Arc;

use futures::{Stream, StreamExt};
use tracing::{info, instrument};

use cirrus_core::{
    BlobMetadata, BlobUploadEvent, FunctionResponse, IngestError, MalformedUploadEvent,
    MetadataLogEntry, ingest, respond, static_greeting, validate_name,
};
use cirrus_store::{BlobKey, BlobStore};

use crate::appender::{AppendConfig, AppendError, AppendReport, MetadataLogAppender};
use crate::best_effort::BestEffort;

/// The static greeting endpoint.
pub fn first_http_function() -> FunctionResponse {
    static_greeting()
}

/// The parameterized greeting endpoint. An absent name counts as empty.
pub fn second_http_function(name: Option<&str>) -> FunctionResponse {
    let result = validate_name(name);
    respond(&result, name.unwrap_or_default())
}

/// What a metadata-log invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSummary {
    /// The line that was (or would have been) appended.
    pub entry: MetadataLogEntry,
    /// Present only when the append succeeded.
    pub appended: Option<AppendReport>,
}

/// Records each upload's metadata as a line in the metadata log.
///
/// Without a store the line is still formatted and logged, but nothing is
/// persisted.
#[derive(Debug, Clone)]
pub struct MetadataLogFunction {
    appender: Option<MetadataLogAppender>,
}

impl MetadataLogFunction {
    pub fn new(store: Option<Arc<dyn BlobStore>>, config: AppendConfig) -> Self {
        Self {
            appender: store.map(|store| MetadataLogAppender::new(store, config)),
        }
    }

    pub fn has_store(&self) -> bool {
        self.appender.is_some()
    }

    /// Location of the log, when a store is configured.
    pub fn log(&self) -> Option<&BlobKey> {
        self.appender.as_ref().map(|appender| &appender.config().log)
    }

    /// Handle one upload.
    ///
    /// Only a malformed event fails the invocation. Append failures are
    /// logged and dropped.
    #[instrument(skip(self, event), fields(blob = %event.path))]
    pub async fn run(
        &self,
        event: &BlobUploadEvent,
    ) -> Result<InvocationSummary, MalformedUploadEvent> {
        let metadata = BlobMetadata::from_event(event)?;
        let entry = MetadataLogEntry::new(&metadata);
        info!(
            name = %metadata.blob_name,
            size = metadata.byte_length,
            "{entry}"
        );

        let outcome: BestEffort<AppendReport, AppendError> = match &self.appender {
            Some(appender) => appender.append(&entry).await.into(),
            None => BestEffort::Skipped("no storage connection configured"),
        };
        let appended = outcome.discard("metadata log append");

        Ok(InvocationSummary { entry, appended })
    }
}

/// Parse an uploaded CSV and log every record.
///
/// Returns the number of records. Nothing is persisted.
#[instrument(skip(event, chunks), fields(blob = %event.path, size = event.length))]
pub async fn ingest_csv_upload<S, B, E>(
    event: &BlobUploadEvent,
    chunks: S,
) -> Result<usize, IngestError>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    info!("processing CSV upload");

    let records = ingest(chunks);
    futures::pin_mut!(records);

    let mut count = 0;
    while let Some(record) = records.next().await {
        let record = record?;
        count += 1;
        info!(row = count, fields = record.len(), "{}", record.join(","));
    }

    info!(records = count, "CSV upload processed");
    Ok(count)
}
