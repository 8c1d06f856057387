use serde::{Deserialize, Serialize};

/// Configuration for the Azure Blob Storage backend.
///
/// The storage account and endpoint normally come from the connection
/// string; the fields here override them or pick the credential used when
/// the connection string carries no SAS token.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AzureStorageConfig {
    /// Azure AD tenant ID.
    #[serde(default)]
    pub tenant_id: Option<String>,

    /// Azure AD application (client) ID.
    #[serde(default)]
    pub client_id: Option<String>,

    /// Azure AD client credential (service principal). Redacted in `Debug`.
    #[serde(default)]
    pub client_credential: Option<String>,

    /// Optional blob endpoint override for local development (e.g. `Azurite`).
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Authenticate as the managed identity of the hosting resource.
    #[serde(default)]
    pub managed_identity: bool,

    /// Client ID of a user-assigned managed identity. Unset means the
    /// system-assigned identity.
    #[serde(default)]
    pub managed_identity_client_id: Option<String>,
}

impl std::fmt::Debug for AzureStorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureStorageConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id.as_ref().map(|_| "[REDACTED]"))
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

impl AzureStorageConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Azure AD tenant ID.
    #[must_use]
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Set the Azure AD application (client) ID.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the Azure AD client credential.
    #[must_use]
    pub fn with_client_credential(mut self, client_credential: impl Into<String>) -> Self {
        self.client_credential = Some(client_credential.into());
        self
    }

    /// Set the endpoint URL override for local development.
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Authenticate as a managed identity. `client_id` selects a
    /// user-assigned identity.
    #[must_use]
    pub fn with_managed_identity(mut self, client_id: Option<String>) -> Self {
        self.managed_identity = true;
        self.managed_identity_client_id = client_id;
        self
    }

    /// Whether a full service principal is configured.
    pub fn has_service_principal(&self) -> bool {
        self.tenant_id.is_some() && self.client_id.is_some() && self.client_credential.is_some()
    }
}
