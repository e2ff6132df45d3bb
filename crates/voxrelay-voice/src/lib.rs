//! Client-side voice path for voxrelay.
//!
//! The browser (or any host with a WebRTC stack) talks to the realtime
//! provider directly; the relay only mints the credential. This crate holds
//! the pieces of that path that have real logic in them:
//!
//! - [`realtime`]: session-creation payloads shared with the relay.
//! - [`transcript`]: folds streamed provider events into an ordered transcript.
//! - [`session`]: the connect / mute / disconnect lifecycle and its resources.
//! - [`meter`]: input level metering.
//! - [`signaling`]: credential and SDP exchange over HTTP.
//!
//! Platform media sit behind the traits in [`media`].

pub mod config;
pub mod error;
pub mod media;
pub mod meter;
pub mod realtime;
pub mod session;
pub mod signaling;
pub mod transcript;

pub use config::{ClientConfig, RealtimeSettings};
pub use error::VoiceError;
pub use media::{LevelTap, MediaStack, Microphone, PeerConnection, Signaling};
pub use meter::LevelMeter;
pub use realtime::{RealtimeSessionGrant, RealtimeSessionRequest, TurnDetection};
pub use session::{SessionOptions, VoiceSession};
pub use signaling::HttpSignaling;
pub use transcript::{Applied, TranscriptReconstructor};
