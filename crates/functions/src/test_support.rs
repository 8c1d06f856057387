//! Store wrappers used by the unit tests in this crate.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Barrier;

use cirrus_store::{BlobKey, BlobStore, StoreError, VersionedBlob, WriteCondition, WriteResult};
use cirrus_store_memory::MemoryBlobStore;

/// Holds the first `parties` reads until all of them have completed, so
/// every gated reader observes the same version before anyone writes.
pub struct GatedStore {
    inner: Arc<MemoryBlobStore>,
    barrier: Barrier,
    parties: usize,
    reads: AtomicUsize,
}

impl GatedStore {
    pub fn new(inner: Arc<MemoryBlobStore>, parties: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(parties),
            parties,
            reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BlobStore for GatedStore {
    fn backend(&self) -> &str {
        "gated"
    }

    async fn get(&self, key: &BlobKey) -> Result<Option<VersionedBlob>, StoreError> {
        let result = self.inner.get(key).await;
        if self.reads.fetch_add(1, Ordering::SeqCst) < self.parties {
            self.barrier.wait().await;
        }
        result
    }

    async fn put(
        &self,
        key: &BlobKey,
        content: Bytes,
        condition: WriteCondition,
    ) -> Result<WriteResult, StoreError> {
        self.inner.put(key, content, condition).await
    }
}

/// Injects failures in front of a memory store and counts calls.
pub struct FlakyStore {
    inner: Arc<MemoryBlobStore>,
    fail_reads: bool,
    fail_writes: bool,
    conflict_writes: bool,
    pub gets: AtomicUsize,
    pub puts: AtomicUsize,
}

impl FlakyStore {
    fn new(inner: Arc<MemoryBlobStore>) -> Self {
        Self {
            inner,
            fail_reads: false,
            fail_writes: false,
            conflict_writes: false,
            gets: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
        }
    }

    pub fn failing_reads(inner: Arc<MemoryBlobStore>) -> Self {
        Self {
            fail_reads: true,
            ..Self::new(inner)
        }
    }

    pub fn failing_writes(inner: Arc<MemoryBlobStore>) -> Self {
        Self {
            fail_writes: true,
            ..Self::new(inner)
        }
    }

    pub fn always_conflicting(inner: Arc<MemoryBlobStore>) -> Self {
        Self {
            conflict_writes: true,
            ..Self::new(inner)
        }
    }
}

#[async_trait]
impl BlobStore for FlakyStore {
    fn backend(&self) -> &str {
        "flaky"
    }

    async fn get(&self, key: &BlobKey) -> Result<Option<VersionedBlob>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads {
            return Err(StoreError::Connection("connection reset".into()));
        }
        self.inner.get(key).await
    }

    async fn put(
        &self,
        key: &BlobKey,
        content: Bytes,
        condition: WriteCondition,
    ) -> Result<WriteResult, StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(StoreError::Backend("container is read-only".into()));
        }
        if self.conflict_writes {
            return Ok(WriteResult::Conflict);
        }
        self.inner.put(key, content, condition).await
    }
}
