//! Credential broker: mints ephemeral realtime sessions.

use crate::api::ApiError;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Extension, Json},
};
use serde_json::Value;
use std::sync::Arc;
use voxrelay_voice::RealtimeSessionRequest;

const SESSIONS_PATH: &str = "/realtime/sessions";

/// Reads `preferredLang` from the body if it is a JSON object carrying a
/// string under that key. Anything else is ignored.
fn preferred_lang(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .get("preferredLang")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Handler for `POST /session`.
///
/// Returns the provider's session object verbatim; its
/// `client_secret.value` is the short-lived token the client negotiates with.
pub async fn create_session_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let preferred_lang = preferred_lang(&body);
    let request = RealtimeSessionRequest::new(&state.realtime, preferred_lang.as_deref());

    let response = state
        .upstream
        .post_json(SESSIONS_PATH, &request, &[("OpenAI-Beta", "realtime=v1")])
        .await
        .map_err(|e| ApiError::from_upstream(e, "Failed to create realtime session."))?;

    let data = response.json_or_raw();
    if !response.is_success() {
        tracing::warn!(status = response.status.as_u16(), details = %data, "realtime session creation rejected");
        return Err(ApiError::Upstream {
            status: response.status,
            error: "Upstream OpenAI error",
            details: data,
        });
    }

    tracing::info!(
        preferred_lang = preferred_lang.as_deref().unwrap_or("auto"),
        "minted realtime session"
    );
    Ok(Json(data))
}
