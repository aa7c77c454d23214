//! Client error types.

use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] sentryflow_protocol::ProtocolError),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("request timeout")]
    Timeout,

    #[error("server error: {0}")]
    Server(String),

    #[error("unexpected reply type: expected {expected}, got {got}")]
    UnexpectedReply { expected: &'static str, got: &'static str },

    #[error("reply sequence mismatch: sent {sent}, got {got}")]
    SeqMismatch { sent: u32, got: u32 },
}
