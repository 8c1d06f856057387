//! How the blob backend authenticates.
//!
//! The SDK in use signs requests with a SAS token or an Entra ID token
//! only. An account key in the connection string cannot be used, so a
//! string that carries nothing else is rejected when the store is built
//! instead of failing on every request.

#[cfg(feature = "blob")]
use std::sync::Arc;

#[cfg(feature = "blob")]
use azure_core::credentials::{Secret, TokenCredential};
#[cfg(feature = "blob")]
use tracing::debug;

use crate::config::AzureStorageConfig;
use crate::connection::StorageConnectionString;
use crate::error::AzureStoreError;

/// Authentication chosen for the blob service.
#[derive(Clone, PartialEq, Eq)]
pub enum BlobAuth {
    /// SAS token from the connection string, appended to the endpoint.
    Sas(String),
    /// Service principal from [`AzureStorageConfig`].
    ServicePrincipal,
    /// Managed identity of the hosting resource. `None` is system-assigned.
    ManagedIdentity { client_id: Option<String> },
    /// The local Azure CLI login.
    AzureCli,
}

impl std::fmt::Debug for BlobAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sas(_) => f.write_str("Sas([REDACTED])"),
            Self::ServicePrincipal => f.write_str("ServicePrincipal"),
            Self::ManagedIdentity { client_id } => f
                .debug_struct("ManagedIdentity")
                .field("client_id", client_id)
                .finish(),
            Self::AzureCli => f.write_str("AzureCli"),
        }
    }
}

impl BlobAuth {
    /// Pick the authentication for a connection string.
    ///
    /// Precedence: SAS token, service principal, managed identity, then the
    /// Azure CLI. The CLI is only a fallback for strings that name an
    /// account and nothing else; a string holding an account key or the
    /// development-storage flag needs one of the other three.
    pub fn resolve(
        conn: &StorageConnectionString,
        config: &AzureStorageConfig,
    ) -> Result<Self, AzureStoreError> {
        if let Some(sas) = &conn.sas_token {
            return Ok(Self::Sas(sas.clone()));
        }
        if config.has_service_principal() {
            return Ok(Self::ServicePrincipal);
        }
        if config.managed_identity {
            return Ok(Self::ManagedIdentity {
                client_id: config.managed_identity_client_id.clone(),
            });
        }
        if conn.development {
            return Err(AzureStoreError::Configuration(
                "UseDevelopmentStorage=true needs a SharedAccessSignature; \
                 account-key signing is not supported"
                    .to_owned(),
            ));
        }
        if conn.has_account_key {
            return Err(AzureStoreError::Configuration(
                "connection string only carries an account key, which cannot sign requests; \
                 add a SharedAccessSignature, configure a service principal, or enable managed_identity"
                    .to_owned(),
            ));
        }
        Ok(Self::AzureCli)
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sas(_) => "sas",
            Self::ServicePrincipal => "service_principal",
            Self::ManagedIdentity { .. } => "managed_identity",
            Self::AzureCli => "azure_cli",
        }
    }
}

/// Build the token credential for `auth`. A SAS token needs none.
#[cfg(feature = "blob")]
pub fn build_azure_credential(
    auth: &BlobAuth,
    config: &AzureStorageConfig,
) -> Result<Option<Arc<dyn TokenCredential>>, AzureStoreError> {
    let credential: Arc<dyn TokenCredential> = match auth {
        BlobAuth::Sas(_) => return Ok(None),
        BlobAuth::ServicePrincipal => {
            let (Some(tenant_id), Some(client_id), Some(client_cred)) = (
                &config.tenant_id,
                &config.client_id,
                &config.client_credential,
            ) else {
                return Err(AzureStoreError::CredentialError(
                    "service principal is incomplete".to_owned(),
                ));
            };
            debug!(tenant_id = %tenant_id, "building ClientSecretCredential");
            azure_identity::ClientSecretCredential::new(
                tenant_id,
                client_id.clone(),
                Secret::new(client_cred.clone()),
                None,
            )
            .map_err(|e| AzureStoreError::CredentialError(e.to_string()))?
        }
        BlobAuth::ManagedIdentity { client_id } => {
            debug!(user_assigned = client_id.is_some(), "building ManagedIdentityCredential");
            let options = azure_identity::ManagedIdentityCredentialOptions {
                user_assigned_id: client_id
                    .clone()
                    .map(azure_identity::UserAssignedId::ClientId),
                ..Default::default()
            };
            azure_identity::ManagedIdentityCredential::new(Some(options))
                .map_err(|e| AzureStoreError::CredentialError(e.to_string()))?
        }
        BlobAuth::AzureCli => azure_identity::AzureCliCredential::new(None)
            .map_err(|e| AzureStoreError::CredentialError(e.to_string()))?,
    };
    Ok(Some(credential))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(raw: &str) -> StorageConnectionString {
        StorageConnectionString::parse(raw).unwrap()
    }

    fn service_principal() -> AzureStorageConfig {
        AzureStorageConfig::new()
            .with_tenant_id("tid")
            .with_client_id("cid")
            .with_client_credential("cred")
    }

    #[test]
    fn sas_takes_precedence() {
        let auth = BlobAuth::resolve(
            &conn("AccountName=acct;AccountKey=k;SharedAccessSignature=sv=1&sig=x"),
            &service_principal(),
        )
        .unwrap();
        assert_eq!(auth, BlobAuth::Sas("sv=1&sig=x".into()));
    }

    #[test]
    fn account_key_with_service_principal() {
        let auth = BlobAuth::resolve(
            &conn("DefaultEndpointsProtocol=https;AccountName=a;AccountKey=k"),
            &service_principal(),
        )
        .unwrap();
        assert_eq!(auth, BlobAuth::ServicePrincipal);
    }

    #[test]
    fn account_key_with_managed_identity() {
        let config = AzureStorageConfig::new().with_managed_identity(None);
        let auth = BlobAuth::resolve(
            &conn("DefaultEndpointsProtocol=https;AccountName=a;AccountKey=k"),
            &config,
        )
        .unwrap();
        assert_eq!(auth, BlobAuth::ManagedIdentity { client_id: None });
        assert_eq!(auth.kind(), "managed_identity");
    }

    #[test]
    fn account_key_alone_is_rejected() {
        let err = BlobAuth::resolve(
            &conn("DefaultEndpointsProtocol=https;AccountName=a;AccountKey=k"),
            &AzureStorageConfig::new(),
        )
        .unwrap_err();
        assert!(matches!(err, AzureStoreError::Configuration(_)));
        assert!(err.to_string().contains("account key"));
    }

    #[test]
    fn development_storage_alone_is_rejected() {
        let err = BlobAuth::resolve(
            &conn("UseDevelopmentStorage=true"),
            &AzureStorageConfig::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("UseDevelopmentStorage"));
    }

    #[test]
    fn incomplete_service_principal_does_not_count() {
        let config = AzureStorageConfig::new().with_tenant_id("tid");
        assert!(BlobAuth::resolve(&conn("AccountName=a;AccountKey=k"), &config).is_err());
    }

    #[test]
    fn bare_account_falls_back_to_cli() {
        let auth = BlobAuth::resolve(&conn("AccountName=a"), &AzureStorageConfig::new()).unwrap();
        assert_eq!(auth, BlobAuth::AzureCli);
    }

    #[test]
    fn debug_redacts_sas() {
        let debug = format!("{:?}", BlobAuth::Sas("sig=secret".into()));
        assert!(!debug.contains("secret"));
    }
}
