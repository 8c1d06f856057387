use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use tower::ServiceExt;

use cirrus_functions::AppendConfig;
use cirrus_server::api::{AppState, router};
use cirrus_server::config::TriggersConfig;
use cirrus_store::{BlobKey, BlobStore};
use cirrus_store_memory::MemoryBlobStore;

// -- Helpers --------------------------------------------------------------

fn append_config() -> AppendConfig {
    AppendConfig {
        retry_backoff: Duration::ZERO,
        ..AppendConfig::default()
    }
}

fn build_test_state(store: Option<Arc<dyn BlobStore>>) -> AppState {
    AppState::new(store, append_config(), TriggersConfig::default())
}

fn log_key() -> BlobKey {
    BlobKey::new("newcontainer", "metadata.log")
}

async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Option<String>, String) {
    let response = router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(http::header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_owned());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn invoke(function: &str, payload: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(http::Method::POST)
        .uri(format!("/{function}"))
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn blob_payload(arg: &str, path: &str, content: &str) -> serde_json::Value {
    serde_json::json!({
        "Data": { arg: content },
        "Metadata": {
            "BlobTrigger": path,
            "Properties": {
                "Length": content.len(),
                "LastModified": "2024-05-01T09:30:00+00:00"
            }
        }
    })
}

async fn read_log(store: &MemoryBlobStore) -> Option<String> {
    store
        .get(&log_key())
        .await
        .unwrap()
        .map(|blob| String::from_utf8(blob.content.to_vec()).unwrap())
}

// -- Health ---------------------------------------------------------------

#[tokio::test]
async fn health_reports_store_backend() {
    let store: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
    let (status, _, body) = send(build_test_state(Some(store)), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["store"], "memory");
}

#[tokio::test]
async fn health_without_store() {
    let (status, _, body) = send(build_test_state(None), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["store"], "none");
}

// -- HTTP functions -------------------------------------------------------

#[tokio::test]
async fn myroute_returns_static_text() {
    let (status, content_type, body) = send(build_test_state(None), get("/api/myroute")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/plain"));
    assert_eq!(body, "Wow this first HTTP Function works!!!!");
}

#[tokio::test]
async fn myroute_accepts_post() {
    let request = Request::builder()
        .method(http::Method::POST)
        .uri("/api/myroute")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(build_test_state(None), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Wow this first HTTP Function works!!!!");
}

#[tokio::test]
async fn newroute_greets_valid_name() {
    let (status, content_type, body) =
        send(build_test_state(None), get("/api/newroute?name=Bob123")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"message": "Hello, Bob123, so glad this Function worked!!"})
    );
}

#[tokio::test]
async fn newroute_without_name_is_rejected() {
    let (status, content_type, body) = send(build_test_state(None), get("/api/newroute")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json, serde_json::json!({"error": "Name cannot be empty"}));
}

#[tokio::test]
async fn newroute_rejects_long_name() {
    let uri = format!("/api/newroute?name={}", "a".repeat(51));
    let (status, _, body) = send(build_test_state(None), get(&uri)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "Name cannot exceed 50 characters");
}

#[tokio::test]
async fn newroute_rejects_space() {
    let (status, _, body) =
        send(build_test_state(None), get("/api/newroute?name=abc%20def")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "Name must be alphanumeric");
}

#[tokio::test]
async fn newroute_repeated_name_uses_first_value() {
    let (status, content_type, body) = send(
        build_test_state(None),
        get("/api/newroute?name=Bob&name=Ann"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"message": "Hello, Bob, so glad this Function worked!!"})
    );
}

#[tokio::test]
async fn newroute_repeated_name_is_validated_as_json() {
    let (status, content_type, body) = send(
        build_test_state(None),
        get("/api/newroute?name=&name=Ann"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "Name cannot be empty");
}

// -- Blob trigger: metadata log -------------------------------------------

#[tokio::test]
async fn metadata_function_appends_to_log() {
    let store = Arc::new(MemoryBlobStore::new());
    let state = build_test_state(Some(store.clone() as Arc<dyn BlobStore>));

    let payload = blob_payload("myblob", "newcontainer/People.csv", "id,name\n1,Ada\n");
    let (status, _, body) = send(state.clone(), invoke("MyFirstBlobFunction", &payload)).await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["Outputs"], serde_json::json!({}));
    assert!(json["ReturnValue"].is_null());
    let expected =
        "Blob: People.csv, Size: 14 bytes, Last Modified: 2024-05-01 09:30:00+00:00";
    assert!(
        json["Logs"]
            .as_array()
            .unwrap()
            .iter()
            .any(|line| line == expected)
    );

    let (status, _, _) = send(state, invoke("MyFirstBlobFunction", &payload)).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(
        read_log(&store).await.unwrap(),
        format!("{expected}\n{expected}")
    );
}

#[tokio::test]
async fn metadata_function_without_store_succeeds() {
    let payload = blob_payload("myblob", "newcontainer/People.csv", "a,b\n");
    let (status, _, body) = send(
        build_test_state(None),
        invoke("MyFirstBlobFunction", &payload),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["Logs"][2], "Metadata log not updated");
}

#[tokio::test]
async fn metadata_function_malformed_path_is_server_error() {
    let store = Arc::new(MemoryBlobStore::new());
    let payload = blob_payload("myblob", "newcontainer/", "");
    let (status, _, body) = send(
        build_test_state(Some(store.clone() as Arc<dyn BlobStore>)),
        invoke("MyFirstBlobFunction", &payload),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("malformed upload event"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn invalid_json_is_bad_request() {
    let request = Request::builder()
        .method(http::Method::POST)
        .uri("/MyFirstBlobFunction")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, body) = send(build_test_state(None), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(json["error"].as_str().unwrap().starts_with("bad invocation payload"));
}

// -- Blob trigger: CSV ingest ---------------------------------------------

#[tokio::test]
async fn ingest_function_counts_records() {
    let payload = blob_payload("readfile", "newcontainer/People2.csv", "a,b,c\n1,2,3\n");
    let (status, _, body) = send(
        build_test_state(None),
        invoke("ReadFileBlobFunction", &payload),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["Logs"][1], "Read 2 records");
}

#[tokio::test]
async fn ingest_function_accepts_unexpected_path() {
    let payload = blob_payload("readfile", "newcontainer/Other.csv", "a\nb\n");
    let (status, _, body) = send(
        build_test_state(None),
        invoke("ReadFileBlobFunction", &payload),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["Logs"][0], "Processing blob: newcontainer/Other.csv");
    assert_eq!(json["Logs"][1], "Read 2 records");
}

#[tokio::test]
async fn ingest_function_has_no_side_effect() {
    let store = Arc::new(MemoryBlobStore::new());
    let payload = blob_payload("readfile", "newcontainer/People2.csv", "x,y\n");
    let (status, _, _) = send(
        build_test_state(Some(store.clone() as Arc<dyn BlobStore>)),
        invoke("ReadFileBlobFunction", &payload),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(store.is_empty());
}
