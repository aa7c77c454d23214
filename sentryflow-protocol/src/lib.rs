//! # sentryflow-protocol
//!
//! Wire protocol implementation for SentryFlow (SFLW framing).
//!
//! This crate provides:
//! - Binary framing with a fixed 20-byte header and CRC-32 payload validation
//! - Streaming decode from a bounded receive buffer
//! - The message-type registry and fixed binary payload codecs

pub mod codec;
pub mod error;
pub mod frame;
pub mod message;

pub use codec::{Decoder, Encoder};
pub use error::ProtocolError;
pub use frame::{Frame, FRAME_HEADER_SIZE, MAGIC};
pub use message::{MsgType, RouteRecord, RouteReply, StatsSnapshot};

/// Protocol version supported by this implementation.
pub const PROTOCOL_VERSION: u8 = 1;

/// Default port for the SentryFlow server.
pub const DEFAULT_PORT: u16 = 9000;

/// Capacity of the per-connection receive buffer.
pub const RECV_BUFFER_CAPACITY: usize = 8192;

/// Maximum payload length accepted by the streaming decoder.
///
/// A frame must fit in the receive buffer alongside its header; anything
/// longer is treated as corrupt.
pub const MAX_FRAME_PAYLOAD: usize = RECV_BUFFER_CAPACITY - FRAME_HEADER_SIZE;

/// Maximum payload length accepted by the encoder (1 MiB).
pub const MAX_ENCODE_PAYLOAD: usize = 1024 * 1024;
