//! Protocol error types.

use thiserror::Error;

/// Protocol-level errors that can occur during framing or payload decoding.
///
/// Any error surfaced by the streaming decoder means the byte stream is
/// compromised; the server treats it as a bad frame and drops the connection.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid magic bytes: expected 'SFLW', got {0:?}")]
    InvalidMagic([u8; 4]),

    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("CRC mismatch: expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch { expected: u32, actual: u32 },

    #[error("receive buffer overflow: {len} bytes (capacity {capacity})")]
    RecvBufferOverflow { len: usize, capacity: usize },

    #[error("short {what} payload: {got} bytes (need {needed})")]
    ShortPayload {
        what: &'static str,
        needed: usize,
        got: usize,
    },
}
