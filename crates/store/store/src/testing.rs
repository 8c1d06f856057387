use bytes::Bytes;

use crate::error::StoreError;
use crate::key::BlobKey;
use crate::store::{BlobStore, ETag, WriteCondition, WriteResult};

fn test_key(name: &str) -> BlobKey {
    BlobKey::new("conformance", name)
}

fn written(result: WriteResult) -> ETag {
    match result {
        WriteResult::Written { etag } => etag,
        WriteResult::Conflict => panic!("expected write to succeed, got conflict"),
    }
}

/// Run the full blob store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if the backend fails an operation outright.
pub async fn run_store_conformance_tests(store: &dyn BlobStore) -> Result<(), StoreError> {
    test_get_missing(store).await?;
    test_overwrite_and_get(store).await?;
    test_if_not_exists(store).await?;
    test_if_match(store).await?;
    test_if_match_on_missing(store).await?;
    test_etag_changes_on_every_write(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn BlobStore) -> Result<(), StoreError> {
    let blob = store.get(&test_key("missing")).await?;
    assert!(blob.is_none(), "get on missing blob should return None");
    Ok(())
}

async fn test_overwrite_and_get(store: &dyn BlobStore) -> Result<(), StoreError> {
    let key = test_key("overwrite");
    store
        .put(&key, Bytes::from_static(b"first"), WriteCondition::Overwrite)
        .await?;
    let etag = written(
        store
            .put(&key, Bytes::from_static(b"second"), WriteCondition::Overwrite)
            .await?,
    );

    let blob = store.get(&key).await?.expect("blob should exist");
    assert_eq!(blob.content, Bytes::from_static(b"second"));
    assert_eq!(blob.etag, etag, "get should report the latest etag");
    Ok(())
}

async fn test_if_not_exists(store: &dyn BlobStore) -> Result<(), StoreError> {
    let key = test_key("create-only");
    let first = store
        .put(&key, Bytes::from_static(b"v1"), WriteCondition::IfNotExists)
        .await?;
    assert!(
        matches!(first, WriteResult::Written { .. }),
        "create on missing blob should succeed"
    );

    let second = store
        .put(&key, Bytes::from_static(b"v2"), WriteCondition::IfNotExists)
        .await?;
    assert_eq!(
        second,
        WriteResult::Conflict,
        "create on existing blob should conflict"
    );

    let blob = store.get(&key).await?.expect("blob should exist");
    assert_eq!(blob.content, Bytes::from_static(b"v1"), "original content should remain");
    Ok(())
}

async fn test_if_match(store: &dyn BlobStore) -> Result<(), StoreError> {
    let key = test_key("if-match");
    let etag = written(
        store
            .put(&key, Bytes::from_static(b"v1"), WriteCondition::Overwrite)
            .await?,
    );

    let stale = ETag::new("stale-tag");
    let result = store
        .put(&key, Bytes::from_static(b"lost"), WriteCondition::IfMatch(stale))
        .await?;
    assert_eq!(result, WriteResult::Conflict, "stale etag should conflict");

    let result = store
        .put(&key, Bytes::from_static(b"v2"), WriteCondition::IfMatch(etag))
        .await?;
    assert!(
        matches!(result, WriteResult::Written { .. }),
        "current etag should succeed"
    );

    let blob = store.get(&key).await?.expect("blob should exist");
    assert_eq!(blob.content, Bytes::from_static(b"v2"));
    Ok(())
}

async fn test_if_match_on_missing(store: &dyn BlobStore) -> Result<(), StoreError> {
    let key = test_key("if-match-missing");
    let result = store
        .put(
            &key,
            Bytes::from_static(b"v1"),
            WriteCondition::IfMatch(ETag::new("anything")),
        )
        .await?;
    assert_eq!(
        result,
        WriteResult::Conflict,
        "if-match against a missing blob should conflict"
    );
    assert!(store.get(&key).await?.is_none());
    Ok(())
}

async fn test_etag_changes_on_every_write(store: &dyn BlobStore) -> Result<(), StoreError> {
    let key = test_key("etag-rotation");
    let first = written(
        store
            .put(&key, Bytes::from_static(b"same"), WriteCondition::Overwrite)
            .await?,
    );
    let second = written(
        store
            .put(&key, Bytes::from_static(b"same"), WriteCondition::Overwrite)
            .await?,
    );
    assert_ne!(first, second, "identical content should still get a new etag");
    Ok(())
}
