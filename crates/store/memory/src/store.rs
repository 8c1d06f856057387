use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;

use cirrus_store::error::StoreError;
use cirrus_store::key::BlobKey;
use cirrus_store::store::{BlobStore, ETag, VersionedBlob, WriteCondition, WriteResult};

/// A single blob held in memory.
#[derive(Debug, Clone)]
struct Entry {
    content: Bytes,
    etag: ETag,
}

/// In-memory [`BlobStore`] backed by a [`DashMap`].
///
/// Conditional writes are decided under the map's per-shard lock, so they
/// are atomic with respect to concurrent writers of the same key.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    data: DashMap<BlobKey, Entry>,
    next_version: AtomicU64,
}

impl MemoryBlobStore {
    /// Create a new, empty in-memory blob store.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_etag(&self) -> ETag {
        let version = self.next_version.fetch_add(1, Ordering::Relaxed) + 1;
        ETag::new(format!("\"0x{version:016X}\""))
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    #[allow(clippy::unnecessary_literal_bound)]
    fn backend(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &BlobKey) -> Result<Option<VersionedBlob>, StoreError> {
        Ok(self
            .data
            .get(key)
            .map(|entry| VersionedBlob {
                content: entry.content.clone(),
                etag: entry.etag.clone(),
            }))
    }

    async fn put(
        &self,
        key: &BlobKey,
        content: Bytes,
        condition: WriteCondition,
    ) -> Result<WriteResult, StoreError> {
        let etag = self.next_etag();
        let entry = Entry {
            content,
            etag: etag.clone(),
        };

        // Use the `entry` API so the precondition check and the write happen
        // under the same shard lock.
        let written = match (self.data.entry(key.clone()), condition) {
            (MapEntry::Occupied(mut occupied), WriteCondition::Overwrite) => {
                occupied.insert(entry);
                true
            }
            (MapEntry::Occupied(mut occupied), WriteCondition::IfMatch(expected)) => {
                if occupied.get().etag == expected {
                    occupied.insert(entry);
                    true
                } else {
                    false
                }
            }
            (MapEntry::Occupied(_), WriteCondition::IfNotExists)
            | (MapEntry::Vacant(_), WriteCondition::IfMatch(_)) => false,
            (MapEntry::Vacant(vacant), WriteCondition::Overwrite | WriteCondition::IfNotExists) => {
                vacant.insert(entry);
                true
            }
        };

        if written {
            Ok(WriteResult::Written { etag })
        } else {
            Ok(WriteResult::Conflict)
        }
    }
}
