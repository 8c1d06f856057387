//! Azure Blob Storage backend for Cirrus.
//!
//! Connection-string parsing, configuration, authentication selection, and
//! error mapping are always available. The [`BlobStore`](cirrus_store::BlobStore) implementation
//! itself, which pulls in the Azure SDK, is behind the `blob` feature.

pub mod auth;
pub mod config;
pub mod connection;
pub mod error;

#[cfg(feature = "blob")]
pub mod blob;

// Re-exports for convenience.
pub use auth::BlobAuth;
pub use config::AzureStorageConfig;
pub use connection::StorageConnectionString;
pub use error::AzureStoreError;

#[cfg(feature = "blob")]
pub use blob::AzureBlobStore;
