//! HTTP gateway against a local server.

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use c2c_console::{Command, ConsoleConfig, Error, Gateway, HttpGateway, Param};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use url::Url;

fn app() -> Router {
    Router::new()
        .route(
            "/api/v1/info",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                if q.get("key").map(String::as_str) == Some("abc123") {
                    (StatusCode::OK, Json(json!({"version": "v2.3.0", "nowConnected": 1})))
                } else {
                    (
                        StatusCode::METHOD_NOT_ALLOWED,
                        Json(json!({"error": "Operation not permitted"})),
                    )
                }
            }),
        )
        .route(
            "/api/v1/echo",
            get(|Query(q): Query<Vec<(String, String)>>, headers: HeaderMap| async move {
                let header = |name: &str| {
                    headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string()
                };
                Json(json!({
                    "query": q,
                    "contentType": header("content-type"),
                    "cacheControl": header("cache-control"),
                }))
            }),
        )
        .route("/api/v1/broken", get(|| async { "definitely not json" }))
        .route(
            "/api/v1/perm",
            post(|Query(q): Query<HashMap<String, String>>, Json(body): Json<Value>| async move {
                Json(json!({"key": q.get("key"), "received": body}))
            }),
        )
        .route(
            "/api/v1/maps/:z/:x/:y",
            get(|Path((z, x, y)): Path<(u8, u32, u32)>| async move {
                format!("tile {}/{}/{}", z, x, y).into_response()
            }),
        )
}

async fn spawn_server() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app()).await.unwrap();
    });
    addr
}

fn gateway(addr: SocketAddr) -> HttpGateway {
    let config = ConsoleConfig::builder()
        .origin(Url::parse(&format!("http://{}", addr)).unwrap())
        .build();
    HttpGateway::new(&config).unwrap()
}

#[test]
fn test_build_url_for_info() {
    let gw = gateway("127.0.0.1:6060".parse().unwrap());
    let url = gw.build_url(Command::Info.as_str(), &[Param::new("key", "abc")]).unwrap();

    assert!(url.path().contains("info"));
    assert!(url.query().unwrap().contains("key=abc"));
}

#[tokio::test]
async fn test_get_resolves_json() {
    let addr = spawn_server().await;
    let body = gateway(addr)
        .get("info", &[Param::access_key("abc123")])
        .await
        .unwrap();

    assert_eq!(body["version"], "v2.3.0");
    assert_eq!(body["nowConnected"], 1);
}

#[tokio::test]
async fn test_non_2xx_rejects_with_status() {
    let addr = spawn_server().await;
    let err = gateway(addr)
        .get("info", &[Param::access_key("wrong")])
        .await
        .unwrap_err();

    match err {
        Error::Status { code, text, message } => {
            assert_eq!(code, 405);
            assert_eq!(text, "Method Not Allowed");
            assert_eq!(message.as_deref(), Some("Operation not permitted"));
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_command_is_404() {
    let addr = spawn_server().await;
    let err = gateway(addr).get("nope", &[]).await.unwrap_err();
    assert_eq!(err.status_code(), Some(404));
    assert_eq!(err.server_message(), None);
}

#[tokio::test]
async fn test_invalid_json_rejects() {
    let addr = spawn_server().await;
    let err = gateway(addr).get("broken", &[]).await.unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

#[tokio::test]
async fn test_connection_refused_rejects() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = gateway(addr).get("info", &[]).await.unwrap_err();
    assert!(matches!(err, Error::Http(_)));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_query_encoding_and_headers() {
    let addr = spawn_server().await;
    let body = gateway(addr)
        .get(
            "echo",
            &[
                Param::new("key", "a&b=c d"),
                Param::new("path", "/"),
                Param::new("key2", "ключ"),
            ],
        )
        .await
        .unwrap();

    assert_eq!(
        body["query"],
        json!([["key", "a&b=c d"], ["path", "/"], ["key2", "ключ"]])
    );
    assert_eq!(body["contentType"], "application/json");
    assert_eq!(body["cacheControl"], "no-cache");
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let addr = spawn_server().await;
    let payload = json!({"name": "Alice", "token": "secret1", "urls": [{"url": "/", "isWrite": false}]});
    let body = gateway(addr)
        .post("perm", &payload, &[Param::access_key("abc123")])
        .await
        .unwrap();

    assert_eq!(body["key"], "abc123");
    assert_eq!(body["received"], payload);
}

#[tokio::test]
async fn test_get_bytes() {
    let addr = spawn_server().await;
    let bytes = gateway(addr)
        .get_bytes("maps/13/4790/2762", &[Param::access_key("abc123")])
        .await
        .unwrap();

    assert_eq!(&bytes[..], b"tile 13/4790/2762");
}
