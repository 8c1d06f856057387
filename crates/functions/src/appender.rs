use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use cirrus_core::MetadataLogEntry;
use cirrus_store::{BlobKey, BlobStore, ETag, StoreError, WriteCondition, WriteResult};

/// Default container holding the metadata log.
pub const DEFAULT_LOG_CONTAINER: &str = "newcontainer";

/// Default blob name of the metadata log.
pub const DEFAULT_LOG_BLOB: &str = "metadata.log";

/// Errors from appending a line to the metadata log.
#[derive(Debug, Error)]
pub enum AppendError {
    /// The current log could not be read. Nothing was written.
    #[error("failed to read metadata log: {0}")]
    Read(StoreError),

    /// The new content could not be written.
    #[error("failed to write metadata log: {0}")]
    Write(StoreError),

    /// The stored log is not valid UTF-8. Nothing was written.
    #[error("metadata log is not valid UTF-8 (at byte {valid_up_to})")]
    Corrupt { valid_up_to: usize },

    /// Every attempt lost the race to a concurrent writer.
    #[error("metadata log still contended after {attempts} attempts")]
    Contention { attempts: u32 },
}

/// Outcome of a successful append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendReport {
    /// Number of read/write rounds it took, starting at 1.
    pub attempts: u32,
    /// Whether this append created the log.
    pub created: bool,
    /// Version of the log after the write.
    pub etag: ETag,
}

/// Settings for [`MetadataLogAppender`].
#[derive(Debug, Clone)]
pub struct AppendConfig {
    /// Location of the log blob.
    pub log: BlobKey,
    /// Total read/write rounds before giving up on contention.
    pub max_attempts: u32,
    /// Delay added per failed attempt before re-reading.
    pub retry_backoff: Duration,
}

impl Default for AppendConfig {
    fn default() -> Self {
        Self {
            log: BlobKey::new(DEFAULT_LOG_CONTAINER, DEFAULT_LOG_BLOB),
            max_attempts: 5,
            retry_backoff: Duration::from_millis(50),
        }
    }
}

impl AppendConfig {
    /// Linear backoff before the retry that follows `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.retry_backoff.saturating_mul(attempt)
    }
}

/// Appends lines to a single log blob using conditional writes.
///
/// Each attempt reads the whole log with its ETag, appends one line, and
/// writes it back only if the log has not changed since the read (or, for a
/// new log, only if it still does not exist). A lost race re-reads and tries
/// again, so concurrent appends never overwrite each other.
#[derive(Clone)]
pub struct MetadataLogAppender {
    store: Arc<dyn BlobStore>,
    config: AppendConfig,
}

impl std::fmt::Debug for MetadataLogAppender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataLogAppender")
            .field("store", &self.store.backend())
            .field("config", &self.config)
            .finish()
    }
}

impl MetadataLogAppender {
    pub fn new(store: Arc<dyn BlobStore>, config: AppendConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &AppendConfig {
        &self.config
    }

    /// Append `entry` as a new line of the log.
    ///
    /// A read failure aborts without writing, so a transient error can never
    /// truncate the log.
    #[instrument(skip(self, entry), fields(log = %self.config.log, attempt))]
    pub async fn append(&self, entry: &MetadataLogEntry) -> Result<AppendReport, AppendError> {
        let max_attempts = self.config.max_attempts.max(1);
        let key = &self.config.log;

        for attempt in 1..=max_attempts {
            tracing::Span::current().record("attempt", attempt);

            let current = self.store.get(key).await.map_err(AppendError::Read)?;

            let (content, condition, created) = match current {
                Some(blob) => {
                    let existing = std::str::from_utf8(&blob.content).map_err(|e| {
                        AppendError::Corrupt {
                            valid_up_to: e.valid_up_to(),
                        }
                    })?;
                    (
                        entry.append_to(Some(existing)),
                        WriteCondition::IfMatch(blob.etag),
                        false,
                    )
                }
                None => (entry.append_to(None), WriteCondition::IfNotExists, true),
            };

            match self
                .store
                .put(key, Bytes::from(content), condition)
                .await
                .map_err(AppendError::Write)?
            {
                WriteResult::Written { etag } => {
                    info!(attempts = attempt, created, etag = %etag, "metadata log updated");
                    return Ok(AppendReport {
                        attempts: attempt,
                        created,
                        etag,
                    });
                }
                WriteResult::Conflict if attempt < max_attempts => {
                    let delay = self.config.delay_for(attempt);
                    debug!(
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "metadata log changed concurrently, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                WriteResult::Conflict => {}
            }
        }

        warn!(attempts = max_attempts, "gave up appending to contended metadata log");
        Err(AppendError::Contention {
            attempts: max_attempts,
        })
    }
}
