//! Translation gateway: one text into many languages via a JSON-mode chat model.

use crate::api::ApiError;
use crate::translate::{parse_completion, ChatCompletionRequest, CompletionError};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Extension, Json},
};
use serde_json::{json, Value};
use std::sync::Arc;
use voxrelay_types::{TranslationRequest, ValidationError};

const COMPLETIONS_PATH: &str = "/chat/completions";

fn parse_body(body: &[u8]) -> Result<Value, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(body).map_err(|_| ValidationError::MalformedBody)
}

/// Handler for `POST /translate`.
pub async fn translate_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let value = parse_body(&body)?;
    let request = TranslationRequest::from_value(&value)?;

    let chat = ChatCompletionRequest::for_translation(&state.translation_model, &request);
    let response = state
        .upstream
        .post_json(COMPLETIONS_PATH, &chat, &[])
        .await
        .map_err(|e| ApiError::from_upstream(e, "Translation failed."))?;

    let Some(data) = response.json() else {
        return Err(ApiError::Protocol {
            error: "Upstream non-JSON",
            field: "raw",
            payload: Value::String(response.body),
        });
    };

    if !response.is_success() {
        tracing::warn!(status = response.status.as_u16(), "translation rejected upstream");
        return Err(ApiError::Upstream {
            status: response.status,
            error: "OpenAI error",
            details: data,
        });
    }

    let result = parse_completion(&data).map_err(|e| match e {
        CompletionError::MissingContent => ApiError::Protocol {
            error: "Missing JSON content from model",
            field: "details",
            payload: data.clone(),
        },
        CompletionError::NonJsonContent(content) => ApiError::Protocol {
            error: "Model returned non-JSON content",
            field: "content",
            payload: Value::String(content),
        },
        CompletionError::UnexpectedShape(content) => ApiError::Protocol {
            error: "Model returned unexpected JSON shape",
            field: "content",
            payload: Value::String(content),
        },
    })?;

    tracing::info!(
        targets = request.targets.len(),
        source_lang = result["source_lang"].as_str().unwrap_or_default(),
        "translated text"
    );
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_body_reads_as_empty_object() {
        assert_eq!(parse_body(b"").unwrap(), json!({}));
        assert_eq!(parse_body(b"  \n").unwrap(), json!({}));
    }

    #[test]
    fn invalid_json_is_malformed() {
        assert_eq!(parse_body(b"{text:"), Err(ValidationError::MalformedBody));
    }
}
