//! Encoder and bounded streaming decoder for SFLW frames.

use crate::error::ProtocolError;
use crate::frame::Frame;
use crate::message::MsgType;
use crate::RECV_BUFFER_CAPACITY;
use bytes::{Bytes, BytesMut};

/// Encodes frames for transmission.
pub struct Encoder;

impl Encoder {
    /// Encodes a frame into bytes.
    pub fn encode_frame(frame: &Frame) -> Result<BytesMut, ProtocolError> {
        frame.encode()
    }

    /// Builds and encodes a frame in one step.
    pub fn encode_message(
        msg_type: MsgType,
        seq: u32,
        payload: Bytes,
    ) -> Result<BytesMut, ProtocolError> {
        Frame::new(msg_type, seq, payload).encode()
    }
}

/// Streaming decoder accumulating partial reads in a bounded buffer.
///
/// The buffer mirrors the per-connection receive buffer of the wire
/// contract: appending past [`RECV_BUFFER_CAPACITY`] unconsumed bytes is an
/// error, and each successful decode consumes exactly one frame.
pub struct Decoder {
    buffer: BytesMut,
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(RECV_BUFFER_CAPACITY),
        }
    }

    /// Appends data to the internal buffer.
    ///
    /// Fails without appending anything if the buffered total would exceed
    /// the receive-buffer capacity.
    pub fn extend(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        let len = self.buffer.len() + data.len();
        if len > RECV_BUFFER_CAPACITY {
            return Err(ProtocolError::RecvBufferOverflow {
                len,
                capacity: RECV_BUFFER_CAPACITY,
            });
        }
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    /// Attempts to decode the next frame from the buffer.
    pub fn decode_frame(&mut self) -> Result<Option<Frame>, ProtocolError> {
        Frame::decode(&mut self.buffer)
    }

    /// Returns the number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Clears the internal buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
