use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("session is already {0}")]
    AlreadyActive(&'static str),

    #[error("No realtime session token from backend: {0}")]
    Credential(String),

    #[error("Microphone unavailable: {0}")]
    Microphone(String),

    #[error("Peer connection error: {0}")]
    PeerConnection(String),

    #[error("SDP negotiation failed: {0}")]
    Negotiation(String),

    #[error("Data channel error: {0}")]
    DataChannel(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
