#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Request, StatusCode, Uri},
    Router,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower::ServiceExt;
use voxrelay_server::{app, config::Config, AppState};

/// One request as seen by the mock provider.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub authorization: Option<String>,
    pub beta: Option<String>,
    pub body: Value,
}

pub struct MockUpstream {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockUpstream {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

/// Starts a provider stand-in answering every request with `status` and `body`.
pub async fn mock_upstream(status: StatusCode, body: impl Into<String>) -> MockUpstream {
    let body: String = body.into();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();

    let router = Router::new().fallback(move |uri: Uri, headers: HeaderMap, payload: Bytes| {
        let seen = seen.clone();
        let body = body.clone();
        async move {
            let header_str = |name: &str| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            seen.lock().unwrap().push(Recorded {
                path: uri.path().to_string(),
                authorization: header_str("authorization"),
                beta: header_str("openai-beta"),
                body: serde_json::from_slice(&payload).unwrap_or(Value::Null),
            });
            (status, [(header::CONTENT_TYPE, "application/json")], body)
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    MockUpstream {
        base_url: format!("http://{}/v1", addr),
        requests,
    }
}

/// A base URL on which nothing is listening.
pub async fn unreachable_upstream() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/v1", addr)
}

pub fn test_state(base_url: &str, api_key: Option<&str>) -> AppState {
    let mut config = Config::default();
    config.upstream.base_url = base_url.to_string();
    config.upstream.api_key = api_key.map(str::to_string);
    config.upstream.timeout_seconds = 5;
    AppState::from_config(&config).unwrap()
}

pub fn test_app(base_url: &str, api_key: Option<&str>) -> Router {
    app(test_state(base_url, api_key))
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

pub async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}
