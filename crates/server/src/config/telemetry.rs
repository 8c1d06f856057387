use serde::Deserialize;

/// Output format of the `fmt` tracing layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Log output configuration.
///
/// # Example
///
/// ```toml
/// [telemetry]
/// format = "json"
/// ```
///
/// The level filter comes from `RUST_LOG` and defaults to `info`.
#[derive(Debug, Default, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub format: LogFormat,
}
