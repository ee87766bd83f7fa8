use crate::codec::CodecError;
use thiserror::Error;

/// Fatal protocol conditions. Every variant terminates the connection; a decode
/// that merely lacks bytes is [`DecodeStatus::NeedMore`](crate::DecodeStatus), not an error.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Unsupported protocol version {got} (expected {expected})")]
    ProtocolMismatch { expected: i32, got: i32 },

    #[error("Malformed field: {0}")]
    MalformedField(String),

    #[error("Unhandled opcode \"{0}\"")]
    UnknownOpcode(u8),

    #[error("{0} is not supported by this client")]
    UnimplementedCapability(&'static str),

    #[error("Login rejected: {0}")]
    LoginRejected(String),

    #[error("Compression failed: {0}")]
    Compression(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl From<CodecError> for ProtocolError {
    fn from(e: CodecError) -> Self {
        ProtocolError::MalformedField(e.to_string())
    }
}

impl ProtocolError {
    /// Reason shown to the player and logged when the session is torn down.
    pub fn disconnect_reason(&self) -> String {
        match self {
            ProtocolError::ProtocolMismatch { .. } => "Unsupported protocol version!".into(),
            ProtocolError::LoginRejected(reason) => reason.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection closed")]
    Closed,
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
