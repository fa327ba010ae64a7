use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use bluedit_upstream::{Credential, RestClient, RestRequest, RestTransport, UpstreamError};
use serde_json::{json, Value};

async fn spawn_backend() -> SocketAddr {
    let app = Router::new()
        .route(
            "/api/v1/posts/1",
            get(|| async { Json(json!({"id": 1, "title": "Hello"})) }),
        )
        .route(
            "/api/v1/subbluedits",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({"error": "bad"})),
                )
            }),
        )
        .route(
            "/api/v1/comments",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({"errors": ["Body can't be blank", "Post must exist"]})),
                )
            }),
        )
        .route(
            "/api/v1/auth/me",
            get(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({"authorization": auth}))
            }),
        )
        .route(
            "/api/v1/echo",
            post(|Json(body): Json<Value>| async move { Json(json!({"received": body})) })
                .put(|Json(body): Json<Value>| async move {
                    Json(json!({"method": "PUT", "received": body}))
                })
                .delete(|| async { Json(json!({"method": "DELETE"})) }),
        )
        .route("/api/v1/empty", post(|| async { StatusCode::NO_CONTENT }))
        .route(
            "/api/v1/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>") }),
        )
        .route(
            "/api/v1/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({}))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr) -> RestClient {
    RestClient::new(format!("http://{addr}/api/v1"), Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn get_returns_json_body() {
    let client = client_for(spawn_backend().await);
    let body = client.get("/posts/1", HeaderMap::new()).await.unwrap();
    assert_eq!(body["title"], "Hello");
}

#[tokio::test]
async fn error_field_becomes_message() {
    let client = client_for(spawn_backend().await);
    let err = client
        .post("/subbluedits", Some(json!({"name": "x"})), HeaderMap::new())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "bad");
    assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
}

#[tokio::test]
async fn errors_list_is_joined() {
    let client = client_for(spawn_backend().await);
    let err = client
        .post("/comments", Some(json!({})), HeaderMap::new())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Body can't be blank, Post must exist");
}

#[tokio::test]
async fn missing_route_is_not_found() {
    let client = client_for(spawn_backend().await);
    let err = client.get("/posts/999", HeaderMap::new()).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Request failed with status code 404");
}

#[tokio::test]
async fn non_json_error_body_uses_status_message() {
    let client = client_for(spawn_backend().await);
    let err = client.get("/broken", HeaderMap::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "Request failed with status code 500");
}

#[tokio::test]
async fn credential_header_is_sent() {
    let client = client_for(spawn_backend().await);
    let request = RestRequest::new(http::Method::GET, "/auth/me")
        .with_credential(Some(&Credential::Bearer("tok".into())))
        .unwrap();
    let body = client.send(request).await.unwrap();
    assert_eq!(body["authorization"], "Bearer tok");
}

#[tokio::test]
async fn json_body_is_forwarded() {
    let client = client_for(spawn_backend().await);
    let body = client
        .post("/echo", Some(json!({"google_token": "g"})), HeaderMap::new())
        .await
        .unwrap();
    assert_eq!(body["received"]["google_token"], "g");
}

#[tokio::test]
async fn put_and_delete_use_their_methods() {
    let client = client_for(spawn_backend().await);
    let body = client
        .put("/echo", Some(json!({"name": "x"})), HeaderMap::new())
        .await
        .unwrap();
    assert_eq!(body["method"], "PUT");
    assert_eq!(body["received"]["name"], "x");

    let body = client.delete("/echo", HeaderMap::new()).await.unwrap();
    assert_eq!(body["method"], "DELETE");
}

#[tokio::test]
async fn empty_success_body_is_null() {
    let client = client_for(spawn_backend().await);
    let body = client.post("/empty", None, HeaderMap::new()).await.unwrap();
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn unreachable_backend_reports_no_response() {
    // Bind and immediately drop to obtain a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(addr);
    let err = client.get("/posts/1", HeaderMap::new()).await.unwrap_err();
    assert!(matches!(err, UpstreamError::NoResponse));
    assert_eq!(err.to_string(), "No response from server");
}

#[tokio::test]
async fn timeout_reports_no_response() {
    let addr = spawn_backend().await;
    let client =
        RestClient::new(format!("http://{addr}/api/v1"), Duration::from_millis(200)).unwrap();
    let err = client.get("/slow", HeaderMap::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "No response from server");
}
