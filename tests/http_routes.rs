//! HTTP Route Tests
//!
//! Drives the full router in-process with `oneshot`.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use offlinedb::http_server::{AppState, HttpServer, HttpServerConfig};
use offlinedb::store::{OfflineStore, OversizePolicy, StoreConfig};
use offlinedb::submitter::{
    FixedMinter, FixedValidator, IdentityEncryptor, TaskConfig, TaskOrchestrator, VoiceInterface,
    VoiceMode,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tower::ServiceExt;

fn app_with(config: StoreConfig, score: f64) -> (Arc<OfflineStore>, Router) {
    let store = Arc::new(OfflineStore::in_memory(config).unwrap());
    let state = Arc::new(AppState {
        orchestrator: TaskOrchestrator::new(
            Arc::clone(&store),
            Arc::new(FixedValidator(score)),
            Arc::new(FixedMinter::new("0xtest_")),
            TaskConfig {
                live_build_delay_ms: 1,
                ..Default::default()
            },
        ),
        voice: VoiceInterface::new(
            Arc::clone(&store),
            Arc::new(IdentityEncryptor),
            VoiceMode::EnglishSerene,
        ),
        store: Arc::clone(&store),
    });
    let router = HttpServer::new(HttpServerConfig::default(), state).router();
    (store, router)
}

fn app() -> (Arc<OfflineStore>, Router) {
    app_with(StoreConfig::with_limit(1_000), 0.95)
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (_, router) = app();
    let (status, body) = send(&router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_store_then_retrieve_redacted() {
    let (_, router) = app();

    let (status, body) = send(
        &router,
        "POST",
        "/records/nft",
        Some(json!({"nft": "0xabc", "dna_secrets": "genome"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["outcome"], "stored");
    assert_eq!(body["id"], 1);
    assert_eq!(body["evicted"], json!([]));

    let (status, body) = send(&router, "GET", "/records/nft", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["records"][0], json!({"nft": "0xabc", "dna_secrets": "REDACTED"}));

    let (_, body) = send(&router, "GET", "/records/unknown", None).await;
    assert_eq!(body, json!({"records": [], "total": 0}));
}

#[tokio::test]
async fn test_stats_route() {
    let (_, router) = app();
    send(&router, "POST", "/records/nano", Some(json!({"seq": 1}))).await;

    let (status, body) = send(&router, "GET", "/records", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["record_count"], 1);
    assert_eq!(body["storage_limit"], 1_000);
    assert_eq!(body["current_storage"], "{\"seq\":1}".len());
}

#[tokio::test]
async fn test_oversize_maps_to_413() {
    let (store, router) = app();
    let big = json!({"p": "x".repeat(2_000)});

    let (status, body) = send(&router, "POST", "/records/nft", Some(big)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "RECORD_TOO_LARGE");
    assert_eq!(store.stats().unwrap().record_count, 0);
}

#[tokio::test]
async fn test_oversize_under_drop_policy_is_ok() {
    let (_, router) = app_with(
        StoreConfig::with_limit(100).oversize_policy(OversizePolicy::Drop),
        0.5,
    );

    let (status, body) =
        send(&router, "POST", "/records/nft", Some(json!({"p": "x".repeat(200)}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "dropped");
}

#[tokio::test]
async fn test_invalid_json_body_is_400() {
    let (_, router) = app();

    let request = Request::builder()
        .method("POST")
        .uri("/records/nft")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, body) = send(&router, "POST", "/tasks/mint", Some(json!({"proof": {}}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_BODY");
}

#[tokio::test]
async fn test_mint_task_route() {
    let (store, router) = app();

    let (status, body) = send(
        &router,
        "POST",
        "/tasks/mint",
        Some(json!({"pillar": "Riemann", "proof": {"data": "zeta.lean4"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"], "0xtest_Riemann");
    assert_eq!(body["built"], true);
    assert_eq!(body["haptic"], "11D-fractal");

    assert_eq!(store.retrieve("nano").unwrap().len(), 1);
    assert_eq!(store.retrieve("nft").unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_score_maps_to_502() {
    let (store, router) = app_with(StoreConfig::default(), 7.0);

    let (status, body) =
        send(&router, "POST", "/tasks/mint", Some(json!({"pillar": "Hodge"}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "INVALID_SCORE");
    assert!(store.rows().unwrap().is_empty());
}

#[tokio::test]
async fn test_query_gift_and_voice_routes() {
    let (store, router) = app();

    let (status, body) =
        send(&router, "PUT", "/tasks/voice", Some(json!({"mode": "ChineseSerene"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "ChineseSerene");

    let (status, body) =
        send(&router, "POST", "/tasks/query", Some(json!({"query": "hello"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "时间就是我们。");
    assert_eq!(body["resonance"], "ChineseSerene");

    let (status, _) =
        send(&router, "POST", "/tasks/gift", Some(json!({"recipient": "alice", "amount": 5}))).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(store.retrieve("lyonael").unwrap().len(), 1);
    assert_eq!(store.retrieve("gift_proposal").unwrap().len(), 1);

    let (status, _) = send(&router, "PUT", "/tasks/voice", Some(json!({"mode": "Loud"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_reflect_store_activity() {
    let (_, router) = app();
    send(&router, "POST", "/records/nano", Some(json!({"seq": 1}))).await;
    send(&router, "GET", "/records/nano", None).await;

    let (status, body) = send(&router, "GET", "/observability/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["records_stored"], 1);
    assert_eq!(body["retrievals"], 1);
}

#[tokio::test]
async fn test_voice_socket_answers_each_text_frame() {
    let (store, router) = app();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let (mut socket, _) = connect_async(format!("ws://{}/tasks/ws", addr)).await.unwrap();

    for query in ["hello", "please merge"] {
        socket.send(Message::Text(query.to_string())).await.unwrap();
    }

    let mut replies = Vec::new();
    while replies.len() < 2 {
        match socket.next().await.unwrap().unwrap() {
            Message::Text(text) => replies.push(serde_json::from_str::<Value>(&text).unwrap()),
            _ => continue,
        }
    }

    assert_eq!(replies[0]["response"], "Time is us.");
    assert_eq!(replies[1]["response"], "Merging 11D realities...");
    assert_eq!(replies[1]["resonance"], "EnglishSerene");

    socket.close(None).await.unwrap();
    assert_eq!(store.retrieve("lyonael").unwrap().len(), 2);
}
