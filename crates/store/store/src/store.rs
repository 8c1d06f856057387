use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;
use crate::key::BlobKey;

/// Opaque version token for a stored blob.
///
/// Every successful write produces a new tag; conditional writes compare
/// against it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ETag(String);

impl ETag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ETag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A blob's full content together with its current version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedBlob {
    pub content: Bytes,
    pub etag: ETag,
}

/// Precondition attached to a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteCondition {
    /// Replace whatever is there.
    Overwrite,
    /// Only create; fail if the blob already exists.
    IfNotExists,
    /// Only replace the version identified by this tag.
    IfMatch(ETag),
}

/// Result of a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// The content was stored under a new version.
    Written { etag: ETag },
    /// The precondition did not hold; nothing was written.
    Conflict,
}

/// Trait for reading and writing whole blobs.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
/// Writes replace the full object; there is no partial or append write.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Short backend name used in logs and the health endpoint.
    fn backend(&self) -> &str;

    /// Read a blob. Returns `None` if it does not exist.
    async fn get(&self, key: &BlobKey) -> Result<Option<VersionedBlob>, StoreError>;

    /// Write a blob's full content subject to `condition`.
    async fn put(
        &self,
        key: &BlobKey,
        content: Bytes,
        condition: WriteCondition,
    ) -> Result<WriteResult, StoreError>;
}
