//! voxrelay server library logic.
//!
//! A small stateless relay between browser clients and the AI provider: it
//! mints ephemeral realtime-voice credentials and forwards translation
//! requests, keeping the provider API key on the server.

pub mod api;
pub mod api_session;
pub mod api_translate;
pub mod config;
pub mod translate;
pub mod upstream;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Extension, Router,
};
use config::Config;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use upstream::OpenAiClient;
use voxrelay_voice::RealtimeSettings;

/// Maximum request body size (1 MiB).
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Authenticated client for the provider.
    pub upstream: OpenAiClient,
    /// Defaults for minted realtime sessions.
    pub realtime: RealtimeSettings,
    /// Chat model used by the translation gateway.
    pub translation_model: String,
    /// Allowed CORS origins; empty allows any.
    pub cors_origins: Vec<String>,
}

impl AppState {
    /// Builds handler state from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            upstream: OpenAiClient::new(&config.upstream, config.logging.debug)?,
            realtime: config.realtime.clone(),
            translation_model: config.translation.model.clone(),
            cors_origins: config.server.cors_origins.clone(),
        })
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(%origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_origins);

    Router::new()
        .route("/", get(api::root_handler))
        .route("/hello", get(api::hello_handler))
        .route("/session", post(api_session::create_session_handler))
        .route(
            "/translate",
            get(api::translate_probe_handler).post(api_translate::translate_handler),
        )
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(Extension(Arc::new(state)))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
