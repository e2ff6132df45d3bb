use axum::{
    body::Bytes,
    extract::Query,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use voxrelay_voice::{ClientConfig, HttpSignaling, Signaling, VoiceError};

#[derive(Default)]
struct Seen {
    session_body: Option<Value>,
    authorization: Option<String>,
    content_type: Option<String>,
    model: Option<String>,
    offer: Option<String>,
}

async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn mock_endpoints(token: &'static str, sdp_status: StatusCode) -> (String, Arc<Mutex<Seen>>) {
    let seen = Arc::new(Mutex::new(Seen::default()));

    let session_seen = seen.clone();
    let sdp_seen = seen.clone();
    let router = Router::new()
        .route(
            "/session",
            post(move |Json(body): Json<Value>| {
                let seen = session_seen.clone();
                async move {
                    seen.lock().unwrap().session_body = Some(body);
                    Json(json!({
                        "id": "sess_123",
                        "client_secret": {"value": token, "expires_at": 1}
                    }))
                }
            }),
        )
        .route(
            "/realtime",
            post(
                move |Query(query): Query<HashMap<String, String>>,
                      headers: HeaderMap,
                      body: Bytes| {
                    let seen = sdp_seen.clone();
                    async move {
                        let mut seen = seen.lock().unwrap();
                        seen.authorization = headers
                            .get(header::AUTHORIZATION)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        seen.content_type = headers
                            .get(header::CONTENT_TYPE)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        seen.model = query.get("model").cloned();
                        seen.offer = Some(String::from_utf8_lossy(&body).into_owned());
                        (sdp_status, "v=0\r\na=answer")
                    }
                },
            ),
        );

    (spawn(router).await, seen)
}

fn config_for(base: &str) -> ClientConfig {
    ClientConfig {
        backend_url: base.to_string(),
        realtime_url: format!("{}/realtime", base),
        ..ClientConfig::default()
    }
}

#[tokio::test]
async fn credential_is_read_from_relay() {
    let (base, seen) = mock_endpoints("ek_live", StatusCode::OK).await;
    let signaling = HttpSignaling::new(&config_for(&base)).unwrap();

    let token = signaling.request_credential(Some("de")).await.unwrap();

    assert_eq!(token, "ek_live");
    assert_eq!(
        seen.lock().unwrap().session_body,
        Some(json!({"preferredLang": "de"}))
    );
}

#[tokio::test]
async fn credential_request_without_language_sends_empty_object() {
    let (base, seen) = mock_endpoints("ek_live", StatusCode::OK).await;
    let signaling = HttpSignaling::new(&config_for(&base)).unwrap();

    signaling.request_credential(None).await.unwrap();
    assert_eq!(seen.lock().unwrap().session_body, Some(json!({})));
}

#[tokio::test]
async fn empty_token_is_a_credential_error() {
    let (base, _seen) = mock_endpoints("", StatusCode::OK).await;
    let signaling = HttpSignaling::new(&config_for(&base)).unwrap();

    let err = signaling.request_credential(None).await.unwrap_err();
    assert!(matches!(err, VoiceError::Credential(_)));
}

#[tokio::test]
async fn relay_error_body_is_a_credential_error() {
    let router = Router::new().route(
        "/session",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Missing OPENAI_API_KEY in env."})),
            )
        }),
    );
    let base = spawn(router).await;
    let signaling = HttpSignaling::new(&config_for(&base)).unwrap();

    let err = signaling.request_credential(None).await.unwrap_err();
    assert!(matches!(err, VoiceError::Credential(_)));
}

#[tokio::test]
async fn offer_is_posted_with_bearer_token() {
    let (base, seen) = mock_endpoints("ek_live", StatusCode::CREATED).await;
    let signaling = HttpSignaling::new(&config_for(&base)).unwrap();

    let answer = signaling.exchange_sdp("ek_live", "v=0\r\na=offer").await.unwrap();

    assert_eq!(answer, "v=0\r\na=answer");
    let seen = seen.lock().unwrap();
    assert_eq!(seen.authorization.as_deref(), Some("Bearer ek_live"));
    assert_eq!(seen.content_type.as_deref(), Some("application/sdp"));
    assert_eq!(seen.model.as_deref(), Some("gpt-4o-realtime-preview"));
    assert_eq!(seen.offer.as_deref(), Some("v=0\r\na=offer"));
}

#[tokio::test]
async fn rejected_offer_is_a_negotiation_error() {
    let (base, _seen) = mock_endpoints("ek_live", StatusCode::UNAUTHORIZED).await;
    let signaling = HttpSignaling::new(&config_for(&base)).unwrap();

    let err = signaling.exchange_sdp("expired", "v=0").await.unwrap_err();
    assert!(matches!(err, VoiceError::Negotiation(ref msg) if msg.contains("401")));
}
