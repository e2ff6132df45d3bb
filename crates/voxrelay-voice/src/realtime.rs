//! Realtime session payloads.
//!
//! The relay posts a [`RealtimeSessionRequest`] to the provider to mint an
//! ephemeral credential; the provider answers with a session object whose
//! `client_secret.value` is the bearer token the client negotiates with.

use crate::config::RealtimeSettings;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const DETECT_LANGUAGE: &str =
    "Detect the user's language from the transcript and reply in the same language.";
const KEEP_CONCISE: &str =
    "Keep replies concise and ALWAYS include a text transcript with the audio.";
const PRESERVE_VERBATIM: &str =
    "Preserve numbers, units, product names, URLs, and code blocks verbatim.";

/// Server-side voice activity detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnDetection {
    #[serde(rename = "type")]
    pub detection_type: String,
    pub threshold: f32,
    pub prefix_padding_ms: u32,
    pub silence_duration_ms: u32,
    pub create_response: bool,
    pub interrupt_response: bool,
}

impl Default for TurnDetection {
    fn default() -> Self {
        Self {
            detection_type: "server_vad".to_string(),
            threshold: 0.5,
            prefix_padding_ms: 300,
            silence_duration_ms: 300,
            create_response: true,
            interrupt_response: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    pub model: String,
}

/// Body of the provider's session-creation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealtimeSessionRequest {
    pub model: String,
    pub voice: String,
    pub modalities: Vec<String>,
    pub instructions: String,
    pub input_audio_transcription: TranscriptionConfig,
    pub turn_detection: TurnDetection,
}

impl RealtimeSessionRequest {
    pub fn new(settings: &RealtimeSettings, preferred_lang: Option<&str>) -> Self {
        Self {
            model: settings.model.clone(),
            voice: settings.voice.clone(),
            modalities: vec!["audio".to_string(), "text".to_string()],
            instructions: session_instructions(preferred_lang),
            input_audio_transcription: TranscriptionConfig {
                model: settings.transcription_model.clone(),
            },
            turn_detection: settings.turn_detection.clone(),
        }
    }
}

/// Standing instructions for the assistant.
///
/// A blank preferred language is treated as absent.
pub fn session_instructions(preferred_lang: Option<&str>) -> String {
    let language = match preferred_lang.map(str::trim).filter(|lang| !lang.is_empty()) {
        Some(lang) => format!("Reply in {lang} unless the user asks for a different language."),
        None => DETECT_LANGUAGE.to_string(),
    };
    [language.as_str(), KEEP_CONCISE, PRESERVE_VERBATIM].join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecret {
    pub value: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

/// The subset of the provider's session object the client relies on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RealtimeSessionGrant {
    #[serde(default)]
    pub id: Option<String>,
    pub client_secret: ClientSecret,
}

impl RealtimeSessionGrant {
    /// The bearer token, if the provider issued a non-empty one.
    pub fn token(&self) -> Option<&str> {
        Some(self.client_secret.value.as_str()).filter(|value| !value.is_empty())
    }
}

/// `response.create` event asking the assistant to speak first.
pub fn response_create(instructions: &str) -> Value {
    json!({
        "type": "response.create",
        "response": {
            "instructions": instructions,
            "modalities": ["audio", "text"],
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_follow_preferred_language() {
        let text = session_instructions(Some("French"));
        assert!(text.starts_with("Reply in French unless the user asks for a different language."));
        assert!(text.contains(KEEP_CONCISE));
        assert!(text.ends_with(PRESERVE_VERBATIM));
    }

    #[test]
    fn instructions_detect_language_without_preference() {
        assert!(session_instructions(None).starts_with(DETECT_LANGUAGE));
        assert!(session_instructions(Some("  ")).starts_with(DETECT_LANGUAGE));
    }

    #[test]
    fn session_request_wire_shape() {
        let request = RealtimeSessionRequest::new(&RealtimeSettings::default(), None);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "gpt-4o-realtime-preview");
        assert_eq!(value["voice"], "verse");
        assert_eq!(value["modalities"], json!(["audio", "text"]));
        assert_eq!(value["input_audio_transcription"]["model"], "whisper-1");
        assert_eq!(value["turn_detection"]["type"], "server_vad");
        assert_eq!(value["turn_detection"]["threshold"], 0.5);
        assert_eq!(value["turn_detection"]["prefix_padding_ms"], 300);
        assert_eq!(value["turn_detection"]["silence_duration_ms"], 300);
        assert_eq!(value["turn_detection"]["create_response"], true);
        assert_eq!(value["turn_detection"]["interrupt_response"], true);
    }

    #[test]
    fn grant_exposes_token() {
        let grant: RealtimeSessionGrant = serde_json::from_value(json!({
            "id": "sess_1",
            "object": "realtime.session",
            "client_secret": {"value": "ek_abc", "expires_at": 1700000000}
        }))
        .unwrap();
        assert_eq!(grant.token(), Some("ek_abc"));
        assert_eq!(grant.client_secret.expires_at, Some(1_700_000_000));

        let empty: RealtimeSessionGrant =
            serde_json::from_value(json!({"client_secret": {"value": ""}})).unwrap();
        assert_eq!(empty.token(), None);
    }

    #[test]
    fn greeting_event_shape() {
        let event = response_create("Say hi.");
        assert_eq!(event["type"], "response.create");
        assert_eq!(event["response"]["instructions"], "Say hi.");
    }
}
