#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use bluedit_gateway::{Gateway, GatewayConfig};
use bluedit_upstream::{RestRequest, RestTransport, UpstreamError};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header};
use serde_json::Value;
use tower::ServiceExt;

pub const SECRET: &str = "test-secret";

#[derive(Default)]
struct StubInner {
    responses: HashMap<(Method, String), Result<Value, UpstreamError>>,
    calls: Vec<RestRequest>,
}

/// In-memory backend: canned responses keyed by method and path, with every
/// request recorded.
#[derive(Clone, Default)]
pub struct StubTransport {
    inner: Arc<Mutex<StubInner>>,
}

impl StubTransport {
    pub fn respond(&self, method: Method, path: &str, response: Result<Value, UpstreamError>) {
        self.inner
            .lock()
            .unwrap()
            .responses
            .insert((method, path.to_string()), response);
    }

    pub fn calls(&self) -> Vec<RestRequest> {
        self.inner.lock().unwrap().calls.clone()
    }
}

impl RestTransport for StubTransport {
    async fn send(&self, request: RestRequest) -> Result<Value, UpstreamError> {
        let mut inner = self.inner.lock().unwrap();
        let key = (request.method.clone(), request.path.clone());
        inner.calls.push(request);
        inner
            .responses
            .get(&key)
            .cloned()
            .unwrap_or(Err(UpstreamError::NoResponse))
    }
}

pub fn not_found() -> UpstreamError {
    UpstreamError::from_response(StatusCode::NOT_FOUND, Some(&serde_json::json!({"error": "Not found"})))
}

pub fn config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.auth.jwt_secret = SECRET.to_string();
    config
}

pub fn app_with(config: GatewayConfig, stub: &StubTransport) -> Router {
    Gateway::builder()
        .with_config(config)
        .with_transport(stub.clone())
        .build()
        .unwrap()
        .router()
        .unwrap()
}

pub fn app(stub: &StubTransport) -> Router {
    app_with(config(), stub)
}

/// Sign a session token expiring at `exp` (Unix seconds).
pub fn token(exp: i64) -> String {
    jsonwebtoken::encode(
        &Header::default(),
        &serde_json::json!({"userId": "42", "email": "user@example.com", "iat": 0, "exp": exp}),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn valid_token() -> String {
    token(chrono::Utc::now().timestamp() + 3600)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: Value,
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    TestResponse {
        status,
        headers,
        json,
    }
}

/// POST a GraphQL payload to `/`, optionally with extra headers.
pub async fn graphql(app: &Router, body: Value, headers: &[(&str, &str)]) -> TestResponse {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    send(app, request).await
}

pub async fn get(app: &Router, path: &str) -> TestResponse {
    let request = Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}
