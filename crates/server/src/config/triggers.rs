use serde::Deserialize;

/// Blob paths that fire each blob-triggered function.
///
/// Invocations whose trigger path differs are still processed, with a
/// warning, since the Functions host owns the actual binding.
#[derive(Debug, Deserialize)]
pub struct TriggersConfig {
    /// Upload path watched by the metadata-log function.
    #[serde(default = "default_metadata_path")]
    pub metadata_path: String,
    /// Upload path watched by the CSV ingest function.
    #[serde(default = "default_ingest_path")]
    pub ingest_path: String,
}

impl Default for TriggersConfig {
    fn default() -> Self {
        Self {
            metadata_path: default_metadata_path(),
            ingest_path: default_ingest_path(),
        }
    }
}

fn default_metadata_path() -> String {
    "newcontainer/People.csv".to_owned()
}

fn default_ingest_path() -> String {
    "newcontainer/People2.csv".to_owned()
}
