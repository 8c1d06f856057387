
use async_trait::async_trait;
use azure_core::http::StatusCode;
use azure_core::http::headers::{HeaderName, Headers};
use azure_storage_blob::BlobServiceClient;
use azure_storage_blob::models::BlockBlobClientUploadOptions;
use bytes::Bytes;
use tracing::{debug, error, info, instrument};

use cirrus_store::{BlobKey, BlobStore, ETag, StoreError, VersionedBlob, WriteCondition, WriteResult};

use crate::auth::{BlobAuth, build_azure_credential};
use crate::config::AzureStorageConfig;
use crate::connection::StorageConnectionString;
use crate::error::{AzureStoreError, classify_azure_error};

const ETAG_HEADER: HeaderName = HeaderName::from_static("etag");

/// Azure Blob Storage implementation of [`BlobStore`].
pub struct AzureBlobStore {
    service_client: BlobServiceClient,
    endpoint: String,
}

impl std::fmt::Debug for AzureBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBlobStore")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl AzureBlobStore {
    /// Build a store from a connection string and optional overrides.
    ///
    /// Fails when the connection string offers no usable authentication
    /// (see [`BlobAuth::resolve`]).
    pub fn from_connection_string(
        connection_string: &str,
        config: &AzureStorageConfig,
    ) -> Result<Self, AzureStoreError> {
        let conn = StorageConnectionString::parse(connection_string)?;
        let auth = BlobAuth::resolve(&conn, config)?;

        let base = config
            .endpoint_url
            .clone()
            .unwrap_or_else(|| conn.blob_endpoint.clone());
        info!(endpoint = %base, auth = auth.kind(), "connecting to Azure Blob Storage");

        let endpoint = match &auth {
            BlobAuth::Sas(sas) => format!("{base}?{sas}"),
            _ => base.clone(),
        };
        let credential = build_azure_credential(&auth, config)?;

        let service_client = BlobServiceClient::new(&endpoint, credential, None)
            .map_err(|e| AzureStoreError::Configuration(format!("blob client error: {e}")))?;

        debug!(endpoint = %base, "Azure Blob Storage client ready");

        Ok(Self {
            service_client,
            endpoint: base,
        })
    }
}

fn etag_from(headers: &Headers) -> Result<ETag, StoreError> {
    headers
        .get_optional_str(&ETAG_HEADER)
        .map(ETag::new)
        .ok_or_else(|| StoreError::Serialization("response carried no ETag header".to_owned()))
}

fn to_store_error(err: &azure_core::Error) -> StoreError {
    let err_str = err.to_string();
    classify_azure_error(&err_str).into()
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    #[allow(clippy::unnecessary_literal_bound)]
    fn backend(&self) -> &str {
        "azure"
    }

    #[instrument(skip(self), fields(store = "azure", blob = %key))]
    async fn get(&self, key: &BlobKey) -> Result<Option<VersionedBlob>, StoreError> {
        let blob_client = self.service_client.blob_client(&key.container, &key.name);

        let response = match blob_client.download(None).await {
            Ok(response) => response,
            Err(e) if e.http_status() == Some(StatusCode::NotFound) => {
                debug!("blob not found");
                return Ok(None);
            }
            Err(e) => {
                error!(error = %e, "blob download failed");
                return Err(to_store_error(&e));
            }
        };

        let etag = etag_from(response.headers())?;
        let content: azure_core::Bytes = response.into_body().collect().await.map_err(|e| {
            StoreError::Backend(format!("failed to read blob body: {e}"))
        })?;

        debug!(size = content.len(), etag = %etag, "blob downloaded");
        Ok(Some(VersionedBlob {
            content: Bytes::copy_from_slice(&content),
            etag,
        }))
    }

    #[instrument(skip(self, content), fields(store = "azure", blob = %key, size = content.len()))]
    async fn put(
        &self,
        key: &BlobKey,
        content: Bytes,
        condition: WriteCondition,
    ) -> Result<WriteResult, StoreError> {
        let blob_client = self.service_client.blob_client(&key.container, &key.name);

        let (overwrite, options) = match condition {
            WriteCondition::Overwrite => (true, None),
            // `overwrite = false` makes the SDK send `If-None-Match: *`.
            WriteCondition::IfNotExists => (false, None),
            WriteCondition::IfMatch(etag) => (
                true,
                Some(BlockBlobClientUploadOptions {
                    if_match: Some(etag.as_str().to_owned()),
                    ..Default::default()
                }),
            ),
        };

        let content_length = content.len() as u64;
        let data: azure_core::Bytes = azure_core::Bytes::copy_from_slice(&content);

        match blob_client
            .upload(data.into(), overwrite, content_length, options)
            .await
        {
            Ok(response) => {
                let etag = etag_from(response.headers())?;
                info!(etag = %etag, "blob written");
                Ok(WriteResult::Written { etag })
            }
            Err(e)
                if matches!(
                    e.http_status(),
                    Some(StatusCode::PreconditionFailed | StatusCode::Conflict)
                ) =>
            {
                debug!(error = %e, "conditional write rejected");
                Ok(WriteResult::Conflict)
            }
            Err(e) => {
                error!(error = %e, "blob upload failed");
                Err(to_store_error(&e))
            }
        }
    }
}
