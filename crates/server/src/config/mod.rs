mod metadata_log;
mod server;
mod storage;
mod telemetry;
mod triggers;


pub use metadata_log::*;
pub use server::*;
pub use storage::*;
pub use telemetry::*;
pub use triggers::*;

use std::path::Path;

use serde::Deserialize;

use crate::error::ServerError;

/// Top-level configuration for the Cirrus server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct CirrusConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Blob store backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Metadata log location and retry policy.
    #[serde(default)]
    pub metadata_log: MetadataLogConfig,
    /// Blob paths that trigger each function.
    #[serde(default)]
    pub triggers: TriggersConfig,
    /// Log output configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl CirrusConfig {
    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults; an unreadable or invalid file is
    /// an error.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ServerError::Config(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    pub fn parse(contents: &str) -> Result<Self, ServerError> {
        toml::from_str(contents).map_err(|e| ServerError::Config(e.to_string()))
    }
}
