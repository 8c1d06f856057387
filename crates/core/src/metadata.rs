use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One completed blob upload, as delivered by the trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobUploadEvent {
    /// Full blob path including the container, e.g. `newcontainer/People.csv`.
    pub path: String,
    /// Size of the uploaded blob in bytes.
    pub length: u64,
    /// Last-modified time reported by the store, when known.
    pub last_modified: Option<DateTime<Utc>>,
}

impl BlobUploadEvent {
    pub fn new(path: impl Into<String>, length: u64) -> Self {
        Self {
            path: path.into(),
            length,
            last_modified: None,
        }
    }

    #[must_use]
    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }
}

/// The upload event could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed upload event: {reason} (path: {path:?})")]
pub struct MalformedUploadEvent {
    pub path: String,
    pub reason: &'static str,
}

/// Metadata extracted from a [`BlobUploadEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMetadata {
    /// Final segment of the blob path.
    pub blob_name: String,
    pub byte_length: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

impl BlobMetadata {
    /// Extract metadata from an upload event.
    ///
    /// The blob name is the segment after the last `/`. Paths that are empty
    /// or end with a separator have no usable name and are rejected.
    pub fn from_event(event: &BlobUploadEvent) -> Result<Self, MalformedUploadEvent> {
        let malformed = |reason| MalformedUploadEvent {
            path: event.path.clone(),
            reason,
        };

        if event.path.trim().is_empty() {
            return Err(malformed("empty blob path"));
        }
        let blob_name = event.path.rsplit('/').next().unwrap_or_default();
        if blob_name.is_empty() {
            return Err(malformed("blob path has no final segment"));
        }

        Ok(Self {
            blob_name: blob_name.to_owned(),
            byte_length: event.length,
            last_modified: event.last_modified,
        })
    }
}

/// A single line destined for the metadata log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataLogEntry {
    line: String,
}

impl MetadataLogEntry {
    /// Format an entry from blob metadata.
    pub fn new(metadata: &BlobMetadata) -> Self {
        let last_modified = metadata
            .last_modified
            .map_or_else(|| "None".to_owned(), |ts| format_timestamp(&ts));
        Self {
            line: format!(
                "Blob: {}, Size: {} bytes, Last Modified: {}",
                metadata.blob_name, metadata.byte_length, last_modified
            ),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.line
    }

    /// Append this entry to the existing log content, if any.
    pub fn append_to(&self, existing: Option<&str>) -> String {
        match existing {
            Some(existing) => format!("{existing}\n{}", self.line),
            None => self.line.clone(),
        }
    }
}

impl std::fmt::Display for MetadataLogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.line)
    }
}

/// Render a timestamp as `2024-05-01 09:30:00+00:00`, adding microseconds
/// only when they are non-zero.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    if ts.nanosecond() / 1_000 == 0 {
        ts.format("%Y-%m-%d %H:%M:%S%:z").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S%.6f%:z").to_string()
    }
}
