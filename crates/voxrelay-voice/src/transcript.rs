//! Transcript reconstruction for realtime data-channel events.
//!
//! The provider streams an assistant response as many small events. Some
//! carry an `item_id` and a text fragment, some only mark an item as done, and
//! other event dialects carry text under different field shapes. This module
//! folds that stream, one event at a time, into an ordered list of
//! [`Message`]s.
//!
//! # Tracks
//!
//! - **Identified**: fragments keyed by `item_id`. Each id owns one message
//!   until its terminal event; afterwards the id is remembered and late
//!   fragments for it are dropped. Only the most recent
//!   [`CLOSED_ITEM_MEMORY`] closed ids are kept.
//! - **Generic**: text found through the fallback field shapes. At most one
//!   generic item is open at a time.
//!
//! The two tracks never merge: an identified fragment does not close the
//! generic message, and vice versa.
//!
//! An item only materializes its message once its buffered text contains a
//! non-whitespace character, so blank fragments never produce a visible line
//! while the concatenation of fragments stays exact.

use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use voxrelay_types::{Message, Role};

const TRANSCRIPT_DELTA: &str = "response.audio_transcript.delta";
const TRANSCRIPT_DONE: &str = "response.audio_transcript.done";
const INPUT_TRANSCRIPTION_COMPLETED: &str =
    "conversation.item.input_audio_transcription.completed";
const PROVIDER_ERROR: &str = "error";

/// How many closed item ids are remembered for dropping late fragments.
pub const CLOSED_ITEM_MEMORY: usize = 1024;

/// Terminal events that end whatever is streaming on the generic track.
const GENERIC_TERMINALS: [&str; 3] = [
    "response.done",
    "response.text.done",
    "response.output_text.done",
];

/// What a single event did to the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A new message was appended at this index.
    Appended(usize),
    /// The message at this index grew.
    Extended(usize),
    /// Text was held back because the item has no visible content yet.
    Buffered,
    /// A streaming item was closed.
    Closed,
    /// The event changed nothing.
    Ignored,
}

#[derive(Debug, Default)]
struct StreamingItem {
    /// Index of the message this item fills, once it is visible.
    message: Option<usize>,
    pending: String,
}

impl StreamingItem {
    fn push(&mut self, fragment: &str, messages: &mut Vec<Message>) -> Applied {
        if let Some(index) = self.message {
            if let Some(message) = messages.get_mut(index) {
                message.text.push_str(fragment);
                return Applied::Extended(index);
            }
        }

        self.pending.push_str(fragment);
        if self.pending.trim().is_empty() {
            return Applied::Buffered;
        }

        messages.push(Message::new(
            Role::Assistant,
            std::mem::take(&mut self.pending),
        ));
        let index = messages.len() - 1;
        self.message = Some(index);
        Applied::Appended(index)
    }
}

/// Folds realtime events into an ordered transcript.
#[derive(Debug, Default)]
pub struct TranscriptReconstructor {
    messages: Vec<Message>,
    open: HashMap<String, StreamingItem>,
    closed: HashSet<String>,
    /// Closing order of `closed`, oldest first.
    closed_order: VecDeque<String>,
    generic: Option<StreamingItem>,
}

impl TranscriptReconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one data-channel payload.
    ///
    /// Payloads that are not JSON are treated as a complete assistant
    /// utterance.
    pub fn apply_raw(&mut self, payload: &str) -> Applied {
        match serde_json::from_str::<Value>(payload) {
            Ok(event) => self.apply(&event),
            Err(_) => self.push_message(Role::Assistant, payload.trim()),
        }
    }

    /// Applies one decoded event. Non-object values carry no text.
    pub fn apply(&mut self, event: &Value) -> Applied {
        let Some(object) = event.as_object() else {
            return Applied::Ignored;
        };

        let kind = object.get("type").and_then(Value::as_str).unwrap_or_default();
        let item_id = object
            .get("item_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty());

        match kind {
            TRANSCRIPT_DELTA => {
                let delta = object.get("delta").and_then(Value::as_str).unwrap_or_default();
                match item_id {
                    Some(id) => self.apply_delta(id, delta),
                    None => self.apply_generic(delta),
                }
            }
            TRANSCRIPT_DONE => {
                let transcript = object.get("transcript").and_then(Value::as_str);
                match item_id {
                    Some(id) => self.close_item(id, transcript),
                    None => self.close_generic(transcript),
                }
            }
            INPUT_TRANSCRIPTION_COMPLETED => {
                let transcript = object
                    .get("transcript")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                self.push_message(Role::User, transcript.trim())
            }
            PROVIDER_ERROR => {
                let detail = event
                    .pointer("/error/message")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if detail.trim().is_empty() {
                    Applied::Ignored
                } else {
                    tracing::warn!(detail, "realtime provider reported an error");
                    self.push_message(Role::System, &format!("Provider error: {}", detail.trim()))
                }
            }
            terminal if GENERIC_TERMINALS.contains(&terminal) => {
                self.close_generic(generic_text(object))
            }
            _ => match generic_text(object) {
                Some(text) if !text.trim().is_empty() => self.apply_generic(text),
                _ => Applied::Ignored,
            },
        }
    }

    /// Appends a complete message. Blank text is ignored.
    pub fn push_message(&mut self, role: Role, text: &str) -> Applied {
        if text.trim().is_empty() {
            return Applied::Ignored;
        }
        self.messages.push(Message::new(role, text));
        Applied::Appended(self.messages.len() - 1)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of items currently receiving fragments, generic item included.
    pub fn open_items(&self) -> usize {
        self.open.len() + usize::from(self.generic.is_some())
    }

    pub fn is_open(&self, item_id: &str) -> bool {
        self.open.contains_key(item_id)
    }

    pub fn is_generic_open(&self) -> bool {
        self.generic.is_some()
    }

    /// Drops every message and every streaming item.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.open.clear();
        self.closed.clear();
        self.closed_order.clear();
        self.generic = None;
    }

    fn apply_delta(&mut self, item_id: &str, delta: &str) -> Applied {
        if delta.is_empty() {
            return Applied::Ignored;
        }
        if self.closed.contains(item_id) {
            tracing::debug!(item_id, "dropping delta for closed transcript item");
            return Applied::Ignored;
        }

        let item = self.open.entry(item_id.to_string()).or_default();
        item.push(delta, &mut self.messages)
    }

    fn apply_generic(&mut self, text: &str) -> Applied {
        if text.is_empty() {
            return Applied::Ignored;
        }
        let item = self.generic.get_or_insert_with(StreamingItem::default);
        item.push(text, &mut self.messages)
    }

    fn close_item(&mut self, item_id: &str, transcript: Option<&str>) -> Applied {
        let newly_closed = self.remember_closed(item_id);

        if let Some(item) = self.open.remove(item_id) {
            if item.message.is_none() {
                tracing::debug!(item_id, "closed transcript item without visible text");
            }
            return Applied::Closed;
        }
        if !newly_closed {
            return Applied::Ignored;
        }

        // Terminal event for an item that never streamed: only a full
        // transcript makes it worth a line.
        self.push_message(Role::Assistant, transcript.unwrap_or_default())
    }

    /// Records `item_id` as closed, forgetting the oldest id past the limit.
    /// Returns `false` if it was already known.
    fn remember_closed(&mut self, item_id: &str) -> bool {
        if !self.closed.insert(item_id.to_string()) {
            return false;
        }
        self.closed_order.push_back(item_id.to_string());
        if self.closed_order.len() > CLOSED_ITEM_MEMORY {
            if let Some(oldest) = self.closed_order.pop_front() {
                self.closed.remove(&oldest);
            }
        }
        true
    }

    fn close_generic(&mut self, text: Option<&str>) -> Applied {
        if self.generic.take().is_some() {
            return Applied::Closed;
        }
        self.push_message(Role::Assistant, text.unwrap_or_default())
    }
}

/// First non-empty text among the field shapes used by the provider's event
/// dialects, in priority order.
fn generic_text(object: &Map<String, Value>) -> Option<&str> {
    let candidates = [
        object
            .get("delta")
            .and_then(|delta| delta.get("content"))
            .and_then(|content| content.get(0))
            .and_then(|part| part.get("text")),
        object
            .get("content")
            .and_then(|content| content.get(0))
            .and_then(|part| part.get("text")),
        object.get("output_text").and_then(|output| output.get("delta")),
        object.get("text"),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find(|text| !text.is_empty())
}
