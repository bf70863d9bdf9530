//! Wire-shape tests for the PostgREST-backed record store.

use wiremock::matchers::{body_partial_json, header, headers, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use webuni_core::{Bucket, SyncRecord};
use webuni_sync::{RecordStore, RestConfig, RestStore};

fn store_for(server: &MockServer) -> RestStore {
    RestStore::new(RestConfig {
        base_url: server.uri(),
        api_key: "anon-key".to_string(),
        table: "user_data".to_string(),
        timeout_seconds: 5,
    })
    .unwrap()
}

fn record_json() -> serde_json::Value {
    serde_json::json!({
        "device_id": "device_1700000000000_ab12cd34e",
        "data_type": "notes",
        "data": [{"id": 1, "title": "first"}],
        "created_at": "2026-08-01T10:00:00Z",
        "updated_at": "2026-08-02T11:30:00Z"
    })
}

#[tokio::test]
async fn test_fetch_uses_equality_filters_and_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_data"))
        .and(query_param("device_id", "eq.device_1700000000000_ab12cd34e"))
        .and(query_param("data_type", "eq.notes"))
        .and(query_param("select", "*"))
        .and(header("apikey", "anon-key"))
        .and(header("Authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([record_json()])))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let record = store
        .fetch("device_1700000000000_ab12cd34e", Bucket::Notes)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.data_type, "notes");
    assert_eq!(record.data[0]["title"], "first");
}

#[tokio::test]
async fn test_fetch_empty_result_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let record = store.fetch("device_x", Bucket::Feed).await.unwrap();
    assert!(record.is_none());
}

#[tokio::test]
async fn test_fetch_http_error_is_store_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = store_for(&server);
    assert!(store.fetch("device_x", Bucket::Feed).await.is_err());
}

#[tokio::test]
async fn test_upsert_posts_with_conflict_resolution() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/user_data"))
        .and(query_param("on_conflict", "device_id,data_type"))
        // wiremock's `header` matcher splits request values on commas, so a
        // comma-containing value must be matched with `headers`.
        .and(headers(
            "Prefer",
            vec!["resolution=merge-duplicates", "return=minimal"],
        ))
        .and(header("apikey", "anon-key"))
        .and(body_partial_json(serde_json::json!({
            "device_id": "device_a",
            "data_type": "books",
            "data": {"reading": 2}
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let record = SyncRecord::new("device_a", Bucket::Books, serde_json::json!({"reading": 2}));
    store.upsert(&record).await.unwrap();
}

#[tokio::test]
async fn test_upsert_http_error_is_store_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let record = SyncRecord::new("device_a", Bucket::Books, serde_json::json!(null));
    assert!(store.upsert(&record).await.is_err());
}

#[tokio::test]
async fn test_custom_table_name_in_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/sync_records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let store = RestStore::new(RestConfig {
        base_url: server.uri(),
        api_key: "anon-key".to_string(),
        table: "sync_records".to_string(),
        timeout_seconds: 5,
    })
    .unwrap();

    assert!(store.fetch("device_x", Bucket::User).await.unwrap().is_none());
}
