use serde::Deserialize;

/// Configuration for the blob store backend.
///
/// The connection string itself never lives in the file: it is read from
/// the environment variable named by `connection_env`, as the Functions
/// host provides it.
#[derive(Deserialize)]
pub struct StorageConfig {
    /// Which backend to use: `"memory"` or `"azure"`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Environment variable holding the storage connection string.
    #[serde(default = "default_connection_env")]
    pub connection_env: String,

    /// Entra ID tenant for service-principal authentication.
    pub tenant_id: Option<String>,

    /// Application (client) ID for service-principal authentication.
    pub client_id: Option<String>,

    /// Client secret for service-principal authentication.
    pub client_credential: Option<String>,

    /// Blob endpoint override (e.g. a private endpoint or `Azurite`).
    pub endpoint_url: Option<String>,

    /// Authenticate as the managed identity of the function app.
    #[serde(default)]
    pub managed_identity: bool,

    /// Client ID of a user-assigned managed identity.
    pub managed_identity_client_id: Option<String>,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("backend", &self.backend)
            .field("connection_env", &self.connection_env)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field(
                "client_credential",
                &self.client_credential.as_ref().map(|_| "[REDACTED]"),
            )
            .field("endpoint_url", &self.endpoint_url)
            .field("managed_identity", &self.managed_identity)
            .field("managed_identity_client_id", &self.managed_identity_client_id)
            .finish()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            connection_env: default_connection_env(),
            tenant_id: None,
            client_id: None,
            client_credential: None,
            endpoint_url: None,
            managed_identity: false,
            managed_identity_client_id: None,
        }
    }
}

fn default_backend() -> String {
    "memory".to_owned()
}

fn default_connection_env() -> String {
    "AzureWebJobsStorage".to_owned()
}
