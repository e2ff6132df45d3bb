//! Session lifecycle controller.
//!
//! A [`VoiceSession`] owns everything tied to one realtime conversation: the
//! microphone, the peer connection and its event channel, the level meter,
//! and the transcript. State moves `idle → connecting → connected → idle`,
//! with `connecting → idle` on failure. Every exit path releases all of it
//! together.

use crate::error::VoiceError;
use crate::media::{MediaStack, Microphone, PeerConnection, Signaling};
use crate::meter::LevelMeter;
use crate::realtime::response_create;
use crate::transcript::{Applied, TranscriptReconstructor};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};
use uuid::Uuid;
use voxrelay_types::{ConnectionState, Message, Role};

pub const CONNECTED_NOTICE: &str = "Connected. Speak to the assistant!";

/// Per-session behaviour, usually derived from [`crate::ClientConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub preferred_lang: Option<String>,
    /// Instructions for an opening `response.create`; `None` waits for the user.
    pub greeting: Option<String>,
    pub meter_interval: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            preferred_lang: None,
            greeting: None,
            meter_interval: Duration::from_millis(16),
        }
    }
}

pub struct VoiceSession<S: Signaling, M: MediaStack> {
    signaling: S,
    media: M,
    options: SessionOptions,
    state: ConnectionState,
    session_id: Option<Uuid>,
    muted: bool,
    transcript: TranscriptReconstructor,
    microphone: Option<M::Microphone>,
    peer: Option<M::Peer>,
    events: Option<mpsc::Receiver<String>>,
    meter: Option<LevelMeter>,
}

impl<S: Signaling, M: MediaStack> VoiceSession<S, M> {
    pub fn new(signaling: S, media: M, options: SessionOptions) -> Self {
        Self {
            signaling,
            media,
            options,
            state: ConnectionState::Idle,
            session_id: None,
            muted: false,
            transcript: TranscriptReconstructor::new(),
            microphone: None,
            peer: None,
            events: None,
            meter: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Latest input level (0..=100); zero whenever no meter is running.
    pub fn level(&self) -> u8 {
        self.meter.as_ref().map_or(0, LevelMeter::level)
    }

    pub fn messages(&self) -> &[Message] {
        self.transcript.messages()
    }

    pub fn transcript(&self) -> &TranscriptReconstructor {
        &self.transcript
    }

    /// Whether the meter task is alive.
    pub fn is_metering(&self) -> bool {
        self.meter.as_ref().is_some_and(LevelMeter::is_running)
    }

    /// Connects a new realtime session.
    ///
    /// Rejected while another session is connecting or connected. On failure
    /// every resource acquired so far is released, the session returns to
    /// idle and the error is handed back; nothing is retried.
    pub async fn connect(&mut self) -> Result<(), VoiceError> {
        if self.state.is_active() {
            return Err(VoiceError::AlreadyActive(self.state.as_str()));
        }

        let session_id = Uuid::new_v4();
        self.state = ConnectionState::Connecting;
        self.session_id = Some(session_id);
        tracing::info!(%session_id, "connecting realtime session");

        if let Err(e) = self.establish().await {
            tracing::warn!(%session_id, error = %e, "realtime session failed to connect");
            self.release();
            return Err(e);
        }

        self.state = ConnectionState::Connected;
        self.transcript.push_message(Role::System, CONNECTED_NOTICE);
        self.send_greeting();
        tracing::info!(%session_id, "realtime session connected");
        Ok(())
    }

    async fn establish(&mut self) -> Result<(), VoiceError> {
        let token = self
            .signaling
            .request_credential(self.options.preferred_lang.as_deref())
            .await?;

        let microphone = self.media.open_microphone().await?;
        self.meter = Some(LevelMeter::start(
            microphone.level_tap(),
            self.options.meter_interval,
        ));
        let peer = self.media.create_peer(&microphone).await;
        self.microphone = Some(microphone);

        let peer = self.peer.insert(peer?);
        self.events = peer.take_events();

        let offer = peer.create_offer().await?;
        let answer = self.signaling.exchange_sdp(&token, &offer).await?;
        peer.apply_answer(&answer).await?;
        Ok(())
    }

    fn send_greeting(&mut self) {
        let (Some(greeting), Some(peer)) = (self.options.greeting.as_deref(), self.peer.as_mut())
        else {
            return;
        };
        if let Err(e) = peer.send(&response_create(greeting).to_string()) {
            tracing::warn!(error = %e, "failed to send greeting request");
        }
    }

    /// Sets whether captured audio is transmitted.
    ///
    /// Only the microphone's enablement changes; the connection and the
    /// transcript are untouched. Returns `false` when not connected.
    pub fn set_muted(&mut self, muted: bool) -> bool {
        if self.state != ConnectionState::Connected {
            return false;
        }
        let Some(microphone) = self.microphone.as_mut() else {
            return false;
        };
        microphone.set_enabled(!muted);
        self.muted = muted;
        true
    }

    /// Flips the mute flag and returns the new value.
    pub fn toggle_mute(&mut self) -> bool {
        self.set_muted(!self.muted);
        self.muted
    }

    /// Tears the session down. Safe to call in any state, any number of times.
    pub fn disconnect(&mut self) {
        if let Some(session_id) = self.session_id {
            tracing::info!(%session_id, "disconnecting realtime session");
        }
        self.release();
    }

    /// Applies every event already queued on the data channel, in arrival order.
    ///
    /// Returns how many events were applied.
    pub fn pump_events(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let Some(events) = self.events.as_mut() else {
                break;
            };
            match events.try_recv() {
                Ok(payload) => {
                    self.transcript.apply_raw(&payload);
                    applied += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.on_channel_closed();
                    break;
                }
            }
        }
        applied
    }

    /// Waits for the next data-channel event and applies it.
    ///
    /// Returns `None` once there is no channel left to read.
    pub async fn next_event(&mut self) -> Option<Applied> {
        let payload = self.events.as_mut()?.recv().await;
        match payload {
            Some(payload) => Some(self.transcript.apply_raw(&payload)),
            None => {
                self.on_channel_closed();
                None
            }
        }
    }

    fn on_channel_closed(&mut self) {
        if self.state == ConnectionState::Connected {
            tracing::warn!(
                session_id = ?self.session_id,
                "provider event channel closed, tearing down session"
            );
            self.release();
        } else {
            self.events = None;
        }
    }

    fn release(&mut self) {
        if let Some(mut microphone) = self.microphone.take() {
            microphone.stop();
        }
        if let Some(mut peer) = self.peer.take() {
            peer.close();
        }
        self.events = None;
        if let Some(meter) = self.meter.take() {
            meter.stop();
        }
        self.transcript.clear();
        self.muted = false;
        self.session_id = None;
        self.state = ConnectionState::Idle;
    }
}

impl<S: Signaling, M: MediaStack> Drop for VoiceSession<S, M> {
    fn drop(&mut self) {
        self.release();
    }
}
