//! API error type and liveness probes for the relay.

use crate::upstream::UpstreamError;
use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};
use thiserror::Error;
use voxrelay_types::ValidationError;

/// Message returned whenever the provider API key is absent.
pub const MISSING_CREDENTIAL: &str = "Missing OPENAI_API_KEY in env.";

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The relay is missing configuration it needs for this request.
    #[error("{0}")]
    Configuration(&'static str),

    /// The caller's request was rejected before any upstream call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The provider answered with a non-success status.
    #[error("{error} (upstream status {status})")]
    Upstream {
        status: StatusCode,
        error: &'static str,
        details: Value,
    },

    /// The provider (or its model) answered with something unusable.
    ///
    /// `payload` is echoed to the caller under `field`.
    #[error("{error}")]
    Protocol {
        error: &'static str,
        field: &'static str,
        payload: Value,
    },

    /// The upstream exchange failed without a response.
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    /// Maps a failed upstream call, using `message` for transport failures.
    pub fn from_upstream(err: UpstreamError, message: &'static str) -> Self {
        match err {
            UpstreamError::MissingCredential => ApiError::Configuration(MISSING_CREDENTIAL),
            UpstreamError::Transport(e) => {
                tracing::error!(error = %e, "{}", message);
                ApiError::Internal(message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Configuration(msg) | ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg }))
            }
            ApiError::Validation(e) => (StatusCode::BAD_REQUEST, json!({ "error": e.to_string() })),
            ApiError::Upstream {
                status,
                error,
                details,
            } => (
                status,
                json!({ "error": error, "status": status.as_u16(), "details": details }),
            ),
            ApiError::Protocol {
                error,
                field,
                payload,
            } => {
                let mut body = json!({ "error": error });
                body[field] = payload;
                (StatusCode::BAD_GATEWAY, body)
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Handler for `GET /`.
pub async fn root_handler() -> Json<Value> {
    Json(json!({ "ok": true, "service": "voicechat-backend" }))
}

/// Handler for `GET /hello`.
pub async fn hello_handler() -> Json<Value> {
    Json(json!({ "ok": true, "message": "hello 👋" }))
}

/// Handler for `GET /translate`, so a plain GET confirms the route exists.
pub async fn translate_probe_handler() -> Json<Value> {
    Json(json!({ "ok": true, "route": "translate" }))
}
