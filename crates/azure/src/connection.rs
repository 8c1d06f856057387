use crate::error::AzureStoreError;

/// Blob endpoint of the local `Azurite` emulator.
pub const DEVELOPMENT_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

/// The parts of an Azure Storage connection string that the blob backend uses.
///
/// Connection strings are `;`-separated `Key=Value` pairs, for example
/// `DefaultEndpointsProtocol=https;AccountName=acct;AccountKey=...;EndpointSuffix=core.windows.net`.
/// Values may themselves contain `=` (base64 keys, SAS tokens).
#[derive(Clone, PartialEq, Eq)]
pub struct StorageConnectionString {
    /// Storage account name, when present.
    pub account_name: Option<String>,
    /// Resolved blob service endpoint, without a trailing slash.
    pub blob_endpoint: String,
    /// Shared access signature, without a leading `?`.
    pub sas_token: Option<String>,
    /// Whether the string carried an account key.
    pub has_account_key: bool,
    /// Whether the string was `UseDevelopmentStorage=true`.
    pub development: bool,
}

impl std::fmt::Debug for StorageConnectionString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConnectionString")
            .field("account_name", &self.account_name)
            .field("blob_endpoint", &self.blob_endpoint)
            .field("sas_token", &self.sas_token.as_ref().map(|_| "[REDACTED]"))
            .field("has_account_key", &self.has_account_key)
            .field("development", &self.development)
            .finish()
    }
}

impl StorageConnectionString {
    /// Parse a connection string.
    ///
    /// The blob endpoint is taken from `BlobEndpoint` when present, from the
    /// emulator address when `UseDevelopmentStorage=true`, and otherwise built
    /// from `DefaultEndpointsProtocol`, `AccountName`, and `EndpointSuffix`.
    pub fn parse(raw: &str) -> Result<Self, AzureStoreError> {
        let mut protocol = None;
        let mut account_name = None;
        let mut account_key = None;
        let mut endpoint_suffix = None;
        let mut blob_endpoint = None;
        let mut sas_token = None;
        let mut development = false;

        for pair in raw.split(';') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                AzureStoreError::ConnectionString(format!(
                    "expected Key=Value, got '{}'",
                    truncate_pair(pair)
                ))
            })?;
            let value = value.trim().to_owned();
            match key.trim() {
                "DefaultEndpointsProtocol" => protocol = Some(value),
                "AccountName" => account_name = Some(value),
                "AccountKey" => account_key = Some(value),
                "EndpointSuffix" => endpoint_suffix = Some(value),
                "BlobEndpoint" => blob_endpoint = Some(value),
                "SharedAccessSignature" => {
                    sas_token = Some(value.trim_start_matches('?').to_owned());
                }
                "UseDevelopmentStorage" => development = value.eq_ignore_ascii_case("true"),
                // Endpoints for queues, tables, and files are irrelevant here.
                _ => {}
            }
        }

        let blob_endpoint = match (blob_endpoint, development, &account_name) {
            (Some(endpoint), _, _) => endpoint,
            (None, true, _) => DEVELOPMENT_BLOB_ENDPOINT.to_owned(),
            (None, false, Some(account)) => format!(
                "{}://{account}.blob.{}",
                protocol.as_deref().unwrap_or("https"),
                endpoint_suffix.as_deref().unwrap_or("core.windows.net"),
            ),
            (None, false, None) => {
                return Err(AzureStoreError::ConnectionString(
                    "neither BlobEndpoint nor AccountName is set".to_owned(),
                ));
            }
        };

        Ok(Self {
            account_name,
            blob_endpoint: blob_endpoint.trim_end_matches('/').to_owned(),
            sas_token,
            has_account_key: account_key.is_some(),
            development,
        })
    }
}

/// Shorten a malformed pair so a pasted secret never reaches error text whole.
fn truncate_pair(pair: &str) -> String {
    pair.chars().take(24).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_account_string() {
        let conn = StorageConnectionString::parse(
            "DefaultEndpointsProtocol=https;AccountName=acct;AccountKey=abc==;EndpointSuffix=core.windows.net",
        )
        .unwrap();
        assert_eq!(conn.account_name.as_deref(), Some("acct"));
        assert_eq!(conn.blob_endpoint, "https://acct.blob.core.windows.net");
        assert!(conn.has_account_key);
        assert!(conn.sas_token.is_none());
    }

    #[test]
    fn defaults_protocol_and_suffix() {
        let conn = StorageConnectionString::parse("AccountName=acct").unwrap();
        assert_eq!(conn.blob_endpoint, "https://acct.blob.core.windows.net");
        assert!(!conn.has_account_key);
    }

    #[test]
    fn sovereign_cloud_suffix() {
        let conn = StorageConnectionString::parse(
            "DefaultEndpointsProtocol=https;AccountName=acct;EndpointSuffix=core.chinacloudapi.cn",
        )
        .unwrap();
        assert_eq!(conn.blob_endpoint, "https://acct.blob.core.chinacloudapi.cn");
    }

    #[test]
    fn explicit_blob_endpoint_with_sas() {
        let conn = StorageConnectionString::parse(
            "BlobEndpoint=https://acct.blob.core.windows.net/;SharedAccessSignature=?sv=2022-11-02&sig=x%3D",
        )
        .unwrap();
        assert_eq!(conn.blob_endpoint, "https://acct.blob.core.windows.net");
        assert_eq!(conn.sas_token.as_deref(), Some("sv=2022-11-02&sig=x%3D"));
        assert!(conn.account_name.is_none());
    }

    #[test]
    fn development_storage() {
        let conn = StorageConnectionString::parse("UseDevelopmentStorage=true").unwrap();
        assert_eq!(conn.blob_endpoint, DEVELOPMENT_BLOB_ENDPOINT);
        assert!(conn.development);
        assert!(!conn.has_account_key);
    }

    #[test]
    fn tolerates_trailing_separator_and_whitespace() {
        let conn = StorageConnectionString::parse(" AccountName = acct ; ").unwrap();
        assert_eq!(conn.account_name.as_deref(), Some("acct"));
    }

    #[test]
    fn missing_account_is_an_error() {
        let err = StorageConnectionString::parse("DefaultEndpointsProtocol=https").unwrap_err();
        assert!(matches!(err, AzureStoreError::ConnectionString(_)));
    }

    #[test]
    fn malformed_pair_is_an_error() {
        let err = StorageConnectionString::parse("AccountName=acct;garbage").unwrap_err();
        assert!(err.to_string().contains("garbage"));
    }

    #[test]
    fn debug_redacts_sas() {
        let conn =
            StorageConnectionString::parse("AccountName=acct;SharedAccessSignature=sig=secret")
                .unwrap();
        let debug = format!("{conn:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret"));
    }
}
