//! Shared types and validation for the voxrelay workspace.
//!
//! This crate holds the domain vocabulary used by both sides of the relay:
//! transcript messages and session states for the voice client, and the
//! request/result shapes of the translation gateway. It performs no I/O.
//!
//! Keeping these definitions here lets `voxrelay-voice` and `voxrelay-server`
//! share them without depending on each other.

use serde::{Deserialize, Serialize};

mod translation;

pub use translation::{Formality, TranslationRequest, TranslationResult, ValidationError};

/// Author of a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Speech captured from the local microphone.
    User,
    /// Output of the realtime model.
    Assistant,
    /// Notices produced locally (connection status, provider errors).
    System,
}

impl Role {
    /// Returns the lowercase label used on the wire and in the UI.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

/// One line of the rendered transcript.
///
/// The text of an assistant message grows while its item is streaming and is
/// left untouched once the item has been closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    /// Whether the message has anything worth rendering.
    pub fn is_visible(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Connection state of a voice session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No resources held.
    #[default]
    Idle,
    /// Credential, microphone or negotiation in flight.
    Connecting,
    /// Audio and data channels are open.
    Connected,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }

    /// Whether a session currently owns (or is acquiring) resources.
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }
}
