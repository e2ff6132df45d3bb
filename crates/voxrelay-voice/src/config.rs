//! Realtime session defaults and client-side voice settings.

use crate::realtime::TurnDetection;
use crate::session::SessionOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_REALTIME_MODEL: &str = "gpt-4o-realtime-preview";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";
pub const DEFAULT_REALTIME_URL: &str = "https://api.openai.com/v1/realtime";
pub const DEFAULT_GREETING: &str = "Introduce yourself briefly, then wait for the user.";

fn default_model() -> String {
    DEFAULT_REALTIME_MODEL.to_string()
}

fn default_voice() -> String {
    "verse".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_meter_interval_ms() -> u64 {
    16
}

/// Provider-side defaults for a realtime session, chosen by the relay when it
/// mints a credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeSettings {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    /// Model used to transcribe the caller's audio (auto language detection).
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,
    #[serde(default)]
    pub turn_detection: TurnDetection,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            voice: default_voice(),
            transcription_model: default_transcription_model(),
            turn_detection: TurnDetection::default(),
        }
    }
}

/// Settings for the browser-side half of the voice path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the relay that mints session credentials.
    pub backend_url: String,
    /// Provider endpoint that accepts the SDP offer.
    pub realtime_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Language the assistant should answer in; detected when absent.
    #[serde(default)]
    pub preferred_lang: Option<String>,
    /// Instructions sent as the first `response.create` once the data channel opens.
    #[serde(default)]
    pub greeting: Option<String>,
    /// Polling period of the input level meter, in milliseconds.
    #[serde(default = "default_meter_interval_ms")]
    pub meter_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            realtime_url: DEFAULT_REALTIME_URL.to_string(),
            model: default_model(),
            preferred_lang: None,
            greeting: Some(DEFAULT_GREETING.to_string()),
            meter_interval_ms: default_meter_interval_ms(),
        }
    }
}

impl ClientConfig {
    /// Builds the client configuration from process environment variables.
    ///
    /// - `VOXRELAY_BACKEND_URL` overrides `backend_url`
    /// - `VOXRELAY_REALTIME_URL` overrides `realtime_url`
    /// - `VOXRELAY_REALTIME_MODEL` overrides `model`
    /// - `VOXRELAY_PREFERRED_LANG` sets `preferred_lang`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = non_empty("VOXRELAY_BACKEND_URL") {
            config.backend_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = non_empty("VOXRELAY_REALTIME_URL") {
            config.realtime_url = url;
        }
        if let Some(model) = non_empty("VOXRELAY_REALTIME_MODEL") {
            config.model = model;
        }
        if let Some(lang) = non_empty("VOXRELAY_PREFERRED_LANG") {
            config.preferred_lang = Some(lang);
        }
        config
    }

    /// URL of the relay's credential endpoint.
    pub fn session_endpoint(&self) -> String {
        format!("{}/session", self.backend_url.trim_end_matches('/'))
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            preferred_lang: self.preferred_lang.clone(),
            greeting: self.greeting.clone(),
            meter_interval: Duration::from_millis(self.meter_interval_ms.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_point_at_local_relay() {
        let config = ClientConfig::default();
        assert_eq!(config.session_endpoint(), "http://localhost:3001/session");
        assert_eq!(config.model, "gpt-4o-realtime-preview");
        assert_eq!(config.greeting.as_deref(), Some(DEFAULT_GREETING));
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("VOXRELAY_BACKEND_URL", "https://relay.example.com/"),
            ("VOXRELAY_PREFERRED_LANG", "fr"),
            ("VOXRELAY_REALTIME_MODEL", "   "),
        ]);
        let config = ClientConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.session_endpoint(), "https://relay.example.com/session");
        assert_eq!(config.preferred_lang.as_deref(), Some("fr"));
        // blank values are ignored
        assert_eq!(config.model, DEFAULT_REALTIME_MODEL);
    }

    #[test]
    fn realtime_settings_fill_missing_fields() {
        let settings: RealtimeSettings = serde_json::from_str(r#"{"voice": "alloy"}"#).unwrap();
        assert_eq!(settings.voice, "alloy");
        assert_eq!(settings.model, DEFAULT_REALTIME_MODEL);
        assert_eq!(settings.transcription_model, "whisper-1");
        assert_eq!(settings.turn_detection, TurnDetection::default());
    }

    #[test]
    fn session_options_never_use_zero_interval() {
        let config = ClientConfig {
            meter_interval_ms: 0,
            ..ClientConfig::default()
        };
        assert_eq!(config.session_options().meter_interval, Duration::from_millis(1));
    }
}
