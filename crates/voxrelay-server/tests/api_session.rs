mod common;

use axum::http::StatusCode;
use common::{mock_upstream, post_json, test_app, unreachable_upstream};
use serde_json::json;

const SESSION: &str = r#"{"id":"sess_1","object":"realtime.session","client_secret":{"value":"ek_abc","expires_at":1700000000}}"#;

#[tokio::test]
async fn missing_credential_is_configuration_error() {
    let upstream = mock_upstream(StatusCode::OK, SESSION).await;
    let (status, body) = post_json(test_app(&upstream.base_url, None), "/session", "{}").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Missing OPENAI_API_KEY in env."}));
    assert!(upstream.requests().is_empty());
}

#[tokio::test]
async fn session_is_minted_and_returned_verbatim() {
    let upstream = mock_upstream(StatusCode::OK, SESSION).await;
    let app = test_app(&upstream.base_url, Some("sk-test"));

    let (status, body) = post_json(app, "/session", r#"{"preferredLang":"fr"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::from_str::<serde_json::Value>(SESSION).unwrap());

    let requests = upstream.requests();
    assert_eq!(requests.len(), 1);
    let sent = &requests[0];
    assert_eq!(sent.path, "/v1/realtime/sessions");
    assert_eq!(sent.authorization.as_deref(), Some("Bearer sk-test"));
    assert_eq!(sent.beta.as_deref(), Some("realtime=v1"));
    assert_eq!(sent.body["model"], "gpt-4o-realtime-preview");
    assert_eq!(sent.body["voice"], "verse");
    assert_eq!(sent.body["modalities"], json!(["audio", "text"]));
    assert_eq!(sent.body["input_audio_transcription"], json!({"model": "whisper-1"}));
    assert_eq!(sent.body["turn_detection"]["type"], "server_vad");
    assert_eq!(sent.body["turn_detection"]["silence_duration_ms"], 300);
    assert!(sent.body["instructions"]
        .as_str()
        .unwrap()
        .starts_with("Reply in fr unless the user asks for a different language."));
}

#[tokio::test]
async fn without_preferred_language_the_model_detects_it() {
    let upstream = mock_upstream(StatusCode::OK, SESSION).await;
    let app = test_app(&upstream.base_url, Some("sk-test"));

    let (status, _) = post_json(app, "/session", "").await;

    assert_eq!(status, StatusCode::OK);
    let instructions = upstream.requests()[0].body["instructions"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(instructions.starts_with("Detect the user's language"));
    assert!(instructions.ends_with("code blocks verbatim."));
}

#[tokio::test]
async fn upstream_rejection_keeps_status_and_details() {
    let upstream = mock_upstream(
        StatusCode::UNAUTHORIZED,
        r#"{"error":{"message":"Incorrect API key provided"}}"#,
    )
    .await;
    let app = test_app(&upstream.base_url, Some("sk-bad"));

    let (status, body) = post_json(app, "/session", "{}").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Upstream OpenAI error");
    assert_eq!(body["status"], 401);
    assert_eq!(
        body["details"]["error"]["message"],
        "Incorrect API key provided"
    );
}

#[tokio::test]
async fn non_json_rejection_is_wrapped_as_raw() {
    let upstream = mock_upstream(StatusCode::SERVICE_UNAVAILABLE, "upstream down").await;
    let app = test_app(&upstream.base_url, Some("sk-test"));

    let (status, body) = post_json(app, "/session", "{}").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["details"], json!({"raw": "upstream down"}));
}

#[tokio::test]
async fn transport_failure_is_internal_error() {
    let base_url = unreachable_upstream().await;
    let (status, body) = post_json(test_app(&base_url, Some("sk-test")), "/session", "{}").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to create realtime session."}));
}
