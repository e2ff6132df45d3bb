//! HTTP client for the AI provider.
//!
//! Both relay endpoints make exactly one authenticated JSON POST and then
//! interpret the raw body themselves, so the client hands back the status and
//! the body text untouched.

use crate::config::UpstreamConfig;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Number of body characters logged when upstream debugging is on.
const DEBUG_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// No API key is configured.
    #[error("upstream API key is not configured")]
    MissingCredential,

    /// The request never produced a readable response.
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Status and body of one upstream exchange.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: String,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The body as JSON, if it is JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// The body as JSON, or `{"raw": body}` when it is not.
    pub fn json_or_raw(&self) -> Value {
        self.json().unwrap_or_else(|| json!({ "raw": self.body }))
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    debug: bool,
}

impl OpenAiClient {
    /// Builds a client from configuration.
    ///
    /// `debug` logs the status and a body preview of every response.
    pub fn new(config: &UpstreamConfig, debug: bool) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            debug,
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POSTs `body` as JSON to `path` with bearer auth and any `extra_headers`.
    ///
    /// Fails before sending when no API key is configured.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        extra_headers: &[(&str, &str)],
    ) -> Result<UpstreamResponse, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::MissingCredential)?;

        let url = self.endpoint(path);
        let mut request = self.client.post(&url).bearer_auth(api_key).json(body);
        for (name, value) in extra_headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if self.debug {
            let preview: String = body.chars().take(DEBUG_PREVIEW_CHARS).collect();
            tracing::info!(%url, status = status.as_u16(), body = %preview, "upstream response");
        } else {
            tracing::debug!(%url, status = status.as_u16(), "upstream response");
        }

        Ok(UpstreamResponse { status, body })
    }
}
