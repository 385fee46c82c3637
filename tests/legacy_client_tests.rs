mod common;

use serde_json::json;
use vndb_proxy::config::UpstreamConfig;
use vndb_proxy::error::ProxyError;
use vndb_proxy::legacy::LegacyClient;

use common::{spawn_legacy, spawn_silent_legacy};

fn upstream(port: u16) -> UpstreamConfig {
    UpstreamConfig {
        legacy_host: "127.0.0.1".to_string(),
        legacy_port: port,
        acquire_timeout_ms: 300,
        timeout_secs: 2,
        ..UpstreamConfig::default()
    }
}

#[tokio::test]
async fn test_query_returns_results_body() {
    let (port, seen) = spawn_legacy(r#"results {"num":1,"more":false,"items":[{"id":1}]}"#).await;
    let client = LegacyClient::new(&upstream(port));

    let body = client.query("get vn basic (id = 1)").await.unwrap();

    assert_eq!(body, json!({"num": 1, "more": false, "items": [{"id": 1}]}));
    assert_eq!(seen.lock().unwrap().as_slice(), ["get vn basic (id = 1)"]);
}

#[tokio::test]
async fn test_one_connection_per_query() {
    let (port, seen) = spawn_legacy(r#"results {"num":0,"more":false,"items":[]}"#).await;
    let client = LegacyClient::new(&upstream(port));

    client.query("get vn basic (id = 1)").await.unwrap();
    client.query("get vn basic (id = 2)").await.unwrap();

    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_error_reply() {
    let (port, _) = spawn_legacy(r#"error {"id":"parse","msg":"Invalid command"}"#).await;
    let client = LegacyClient::new(&upstream(port));

    match client.query("get nonsense").await {
        Err(ProxyError::Legacy(body)) => assert_eq!(body["id"], json!("parse")),
        other => panic!("expected legacy error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let port = spawn_silent_legacy().await;
    let client = LegacyClient::new(&upstream(port));

    let err = client.query("get vn basic (id = 1)").await.unwrap_err();
    assert!(matches!(err, ProxyError::Timeout(300)), "got {:?}", err);
}

#[tokio::test]
async fn test_connection_refused() {
    // bind then drop so the port is closed
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = LegacyClient::new(&upstream(port));
    let err = client.query("get vn basic (id = 1)").await.unwrap_err();
    assert!(matches!(err, ProxyError::Io(_)), "got {:?}", err);
}
