use cirrus_store::StoreError;
use thiserror::Error;

/// Errors specific to Azure Blob Storage operations.
#[derive(Debug, Error)]
pub enum AzureStoreError {
    /// The Azure service returned an error.
    #[error("Azure service error: {0}")]
    ServiceError(String),

    /// The request was throttled by the Azure service.
    #[error("Azure request throttled")]
    Throttled,

    /// A network or connection error occurred communicating with Azure.
    #[error("Azure connection error: {0}")]
    Connection(String),

    /// The request timed out.
    #[error("Azure request timed out")]
    Timeout,

    /// The connection string could not be parsed.
    #[error("invalid connection string: {0}")]
    ConnectionString(String),

    /// Azure credential resolution failed.
    #[error("credential error: {0}")]
    CredentialError(String),

    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl From<AzureStoreError> for StoreError {
    fn from(err: AzureStoreError) -> Self {
        match err {
            AzureStoreError::ServiceError(msg) => StoreError::Backend(msg),
            AzureStoreError::Throttled => StoreError::Throttled,
            AzureStoreError::Connection(msg) => StoreError::Connection(msg),
            AzureStoreError::Timeout => StoreError::Timeout(std::time::Duration::from_secs(30)),
            AzureStoreError::ConnectionString(msg)
            | AzureStoreError::CredentialError(msg)
            | AzureStoreError::Configuration(msg) => StoreError::Configuration(msg),
        }
    }
}

/// Classify an Azure SDK error string into the appropriate [`AzureStoreError`].
///
/// Inspects the error message for common patterns (throttling, timeout,
/// connection) and maps them to the correct variant.
pub fn classify_azure_error(error_str: &str) -> AzureStoreError {
    let lower = error_str.to_lowercase();
    if lower.contains("429")
        || lower.contains("throttl")
        || lower.contains("server busy")
        || lower.contains("too many")
    {
        AzureStoreError::Throttled
    } else if lower.contains("timeout") || lower.contains("timed out") {
        AzureStoreError::Timeout
    } else if lower.contains("connection")
        || lower.contains("connect")
        || lower.contains("dns")
        || lower.contains("network")
    {
        AzureStoreError::Connection(error_str.to_owned())
    } else {
        AzureStoreError::ServiceError(error_str.to_owned())
    }
}
