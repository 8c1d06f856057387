use std::time::Duration;

use serde::Deserialize;

use cirrus_functions::AppendConfig;
use cirrus_store::BlobKey;

/// Where the metadata log lives and how appends retry under contention.
#[derive(Debug, Deserialize)]
pub struct MetadataLogConfig {
    /// Container holding the log blob.
    #[serde(default = "default_container")]
    pub container: String,
    /// Name of the log blob.
    #[serde(default = "default_blob_name")]
    pub blob_name: String,
    /// Total read/write rounds before an append gives up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Linear backoff step between rounds, in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for MetadataLogConfig {
    fn default() -> Self {
        Self {
            container: default_container(),
            blob_name: default_blob_name(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl MetadataLogConfig {
    pub fn to_append_config(&self) -> AppendConfig {
        AppendConfig {
            log: BlobKey::new(&self.container, &self.blob_name),
            max_attempts: self.max_attempts,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

fn default_container() -> String {
    cirrus_functions::appender::DEFAULT_LOG_CONTAINER.to_owned()
}

fn default_blob_name() -> String {
    cirrus_functions::appender::DEFAULT_LOG_BLOB.to_owned()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_backoff_ms() -> u64 {
    50
}
