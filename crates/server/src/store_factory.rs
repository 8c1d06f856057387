use std::sync::Arc;

use tracing::info;

use cirrus_azure::{AzureStorageConfig, BlobAuth, StorageConnectionString};
use cirrus_store::BlobStore;
use cirrus_store_memory::MemoryBlobStore;

use crate::config::StorageConfig;
use crate::error::ServerError;

/// Read the storage connection string from the configured variable.
///
/// An unset or blank variable counts as absent.
pub fn connection_from_env(config: &StorageConfig) -> Option<String> {
    connection_from(config, |name| std::env::var(name).ok())
}

/// Resolve the connection string through `lookup`.
///
/// Falls back to the host's identity-based settings,
/// `<variable>__blobServiceUri` and then `<variable>__accountName`, which
/// are turned into `BlobEndpoint=` and `AccountName=` strings.
pub fn connection_from(
    config: &StorageConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    let var = |suffix: &str| {
        lookup(&format!("{}{suffix}", config.connection_env))
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    };

    var("")
        .or_else(|| var("__blobServiceUri").map(|uri| format!("BlobEndpoint={uri}")))
        .or_else(|| var("__accountName").map(|name| format!("AccountName={name}")))
}

/// Create the blob store the metadata-log function writes to.
///
/// Returns `Ok(None)` when no connection string is available: the server
/// still runs, but uploads are not recorded in the metadata log. An Azure
/// connection string with no usable authentication fails here rather than
/// on every upload.
pub fn create_store(
    config: &StorageConfig,
    connection: Option<&str>,
) -> Result<Option<Arc<dyn BlobStore>>, ServerError> {
    let Some(connection) = connection else {
        info!(
            variable = %config.connection_env,
            "no storage connection configured, metadata log appends are disabled"
        );
        return Ok(None);
    };

    let store: Arc<dyn BlobStore> = match config.backend.as_str() {
        "memory" => Arc::new(MemoryBlobStore::new()),
        "azure" => {
            let azure_config = azure_config(config);
            let auth = check_azure_auth(connection, &azure_config)?;
            azure_store(connection, &azure_config, &auth)?
        }
        other => {
            return Err(ServerError::Config(format!(
                "unknown storage backend: {other}"
            )));
        }
    };

    info!(backend = %store.backend(), "blob store initialized");
    Ok(Some(store))
}

fn check_azure_auth(
    connection: &str,
    azure_config: &AzureStorageConfig,
) -> Result<BlobAuth, ServerError> {
    StorageConnectionString::parse(connection)
        .and_then(|conn| BlobAuth::resolve(&conn, azure_config))
        .map_err(|e| ServerError::Config(format!("azure storage: {e}")))
}

#[cfg(feature = "azure-blob")]
fn azure_store(
    connection: &str,
    azure_config: &AzureStorageConfig,
    auth: &BlobAuth,
) -> Result<Arc<dyn BlobStore>, ServerError> {
    info!(auth = auth.kind(), "building Azure blob store");
    let store = cirrus_azure::AzureBlobStore::from_connection_string(connection, azure_config)
        .map_err(|e| ServerError::Config(format!("azure storage: {e}")))?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "azure-blob"))]
fn azure_store(
    _connection: &str,
    _azure_config: &AzureStorageConfig,
    _auth: &BlobAuth,
) -> Result<Arc<dyn BlobStore>, ServerError> {
    Err(ServerError::Config(
        "azure storage backend requires the `azure-blob` feature".into(),
    ))
}

fn azure_config(config: &StorageConfig) -> AzureStorageConfig {
    let mut azure = AzureStorageConfig::default();
    if let Some(tenant_id) = &config.tenant_id {
        azure = azure.with_tenant_id(tenant_id);
    }
    if let Some(client_id) = &config.client_id {
        azure = azure.with_client_id(client_id);
    }
    if let Some(secret) = &config.client_credential {
        azure = azure.with_client_credential(secret);
    }
    if let Some(url) = &config.endpoint_url {
        azure = azure.with_endpoint_url(url);
    }
    if config.managed_identity {
        azure = azure.with_managed_identity(config.managed_identity_client_id.clone());
    }
    azure
}
