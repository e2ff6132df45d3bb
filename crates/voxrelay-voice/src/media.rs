//! Seams between the session controller and the platform.
//!
//! Audio capture and the peer connection belong to the host (a browser, a
//! native WebRTC stack); credential and SDP exchange are plain HTTP. The
//! controller only sees these traits.

use crate::error::VoiceError;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Source of 8-bit time-domain samples for level metering.
pub trait LevelTap: Send + 'static {
    /// Fills `samples` with the most recent window, centred on 128.
    fn read(&mut self, samples: &mut [u8]);
}

/// A captured microphone stream.
pub trait Microphone: Send + Sync {
    fn level_tap(&self) -> Box<dyn LevelTap>;

    /// Enables or disables transmission of captured frames.
    fn set_enabled(&mut self, enabled: bool);

    /// Stops every capture track. Must tolerate repeated calls.
    fn stop(&mut self);
}

/// A peer connection carrying microphone audio out and provider events in.
#[async_trait]
pub trait PeerConnection: Send {
    /// Creates the local SDP offer and installs it as the local description.
    async fn create_offer(&mut self) -> Result<String, VoiceError>;

    /// Installs the provider's SDP answer as the remote description.
    async fn apply_answer(&mut self, answer_sdp: &str) -> Result<(), VoiceError>;

    /// Hands over the receiving end of the provider's event channel.
    ///
    /// Returns `None` after the first call.
    fn take_events(&mut self) -> Option<mpsc::Receiver<String>>;

    /// Sends one client event over the data channel.
    fn send(&mut self, payload: &str) -> Result<(), VoiceError>;

    /// Closes the connection and its channels. Must tolerate repeated calls.
    fn close(&mut self);
}

/// Factory for the platform's media resources.
#[async_trait]
pub trait MediaStack: Send + Sync {
    type Microphone: Microphone;
    type Peer: PeerConnection;

    async fn open_microphone(&self) -> Result<Self::Microphone, VoiceError>;

    /// Creates a peer connection publishing `microphone`.
    async fn create_peer(&self, microphone: &Self::Microphone) -> Result<Self::Peer, VoiceError>;
}

/// Credential retrieval and SDP exchange.
#[async_trait]
pub trait Signaling: Send + Sync {
    /// Asks the relay for an ephemeral realtime credential.
    async fn request_credential(&self, preferred_lang: Option<&str>) -> Result<String, VoiceError>;

    /// Sends the SDP offer to the provider and returns its answer.
    async fn exchange_sdp(&self, token: &str, offer_sdp: &str) -> Result<String, VoiceError>;
}
