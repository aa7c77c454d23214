//! Binary frame format for SFLW.
//!
//! Frame layout (20-byte header + payload, all integers big-endian):
//!
//! ```text
//! +--------+---------+--------+--------+--------+-------------+-------------+
//! | magic  | version |  type  | flags  |  seq   | payload_len | payload_crc |
//! | 4 bytes| 1 byte  | 1 byte |2 bytes |4 bytes |   4 bytes   |   4 bytes   |
//! +--------+---------+--------+--------+--------+-------------+-------------+
//! | payload (payload_len bytes)                                             |
//! +-------------------------------------------------------------------------+
//! ```

use crate::error::ProtocolError;
use crate::message::MsgType;
use crate::{MAX_ENCODE_PAYLOAD, MAX_FRAME_PAYLOAD, PROTOCOL_VERSION};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Magic bytes identifying SFLW frames: "SFLW"
pub const MAGIC: [u8; 4] = *b"SFLW";

/// Size of the fixed frame header in bytes (4+1+1+2+4+4+4 = 20).
pub const FRAME_HEADER_SIZE: usize = 20;

/// Flag bit requesting an acknowledgement (carried, not interpreted).
pub const FLAG_ACK_REQUIRED: u16 = 1 << 0;

/// A parsed SFLW frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Protocol version.
    pub version: u8,
    /// Raw message type byte (see [`MsgType`]).
    pub msg_type: u8,
    /// Frame flags.
    pub flags: u16,
    /// Sequence number, echoed verbatim in replies.
    pub seq: u32,
    /// Frame payload.
    pub payload: Bytes,
}

impl Frame {
    /// Creates a new frame with the current protocol version and no flags.
    pub fn new(msg_type: MsgType, seq: u32, payload: Bytes) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            msg_type: msg_type as u8,
            flags: 0,
            seq,
            payload,
        }
    }

    pub fn with_flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    /// Returns the message type, if it is one this implementation knows.
    pub fn kind(&self) -> Option<MsgType> {
        MsgType::from_u8(self.msg_type)
    }

    /// Encodes the frame into bytes.
    pub fn encode(&self) -> Result<BytesMut, ProtocolError> {
        let payload_len = self.payload.len();
        if payload_len > MAX_ENCODE_PAYLOAD {
            return Err(ProtocolError::FrameTooLarge {
                size: payload_len,
                max: MAX_ENCODE_PAYLOAD,
            });
        }

        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload_len);

        buf.put_slice(&MAGIC);
        buf.put_u8(self.version);
        buf.put_u8(self.msg_type);
        buf.put_u16(self.flags);
        buf.put_u32(self.seq);
        buf.put_u32(payload_len as u32);
        buf.put_u32(crc32fast::hash(&self.payload));
        buf.put_slice(&self.payload);

        Ok(buf)
    }

    /// Decodes a frame from the front of `buf`.
    ///
    /// Returns `Ok(Some(frame))` if a complete frame was decoded (consuming
    /// exactly that frame's bytes), `Ok(None)` if more data is needed, or
    /// `Err` if the stream is corrupt. Consumption is atomic: on `Ok(None)`
    /// and `Err` the buffer is left untouched.
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Self>, ProtocolError> {
        if buf.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        // Peek at the header without consuming
        let magic: [u8; 4] = buf[0..4].try_into().unwrap();
        if magic != MAGIC {
            return Err(ProtocolError::InvalidMagic(magic));
        }

        let version = buf[4];
        if version != PROTOCOL_VERSION {
            return Err(ProtocolError::UnsupportedVersion(version));
        }

        let msg_type = buf[5];
        let flags = u16::from_be_bytes([buf[6], buf[7]]);
        let seq = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]);
        let payload_len = u32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]) as usize;

        if payload_len > MAX_FRAME_PAYLOAD {
            return Err(ProtocolError::FrameTooLarge {
                size: payload_len,
                max: MAX_FRAME_PAYLOAD,
            });
        }

        let crc_expected = u32::from_be_bytes([buf[16], buf[17], buf[18], buf[19]]);

        if buf.len() < FRAME_HEADER_SIZE + payload_len {
            return Ok(None);
        }

        let crc_actual = crc32fast::hash(&buf[FRAME_HEADER_SIZE..FRAME_HEADER_SIZE + payload_len]);
        if crc_actual != crc_expected {
            return Err(ProtocolError::CrcMismatch {
                expected: crc_expected,
                actual: crc_actual,
            });
        }

        buf.advance(FRAME_HEADER_SIZE);
        let payload = buf.split_to(payload_len).freeze();

        Ok(Some(Self {
            version,
            msg_type,
            flags,
            seq,
            payload,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_payload(len: usize) -> Bytes {
        (0..len).map(|i| i as u8).collect::<Vec<u8>>().into()
    }

    #[test]
    fn test_frame_roundtrip() {
        let payload = counting_payload(32);
        let frame = Frame::new(MsgType::Ping, 42, payload.clone()).with_flags(0x1234);

        let mut buf = frame.encode().unwrap();
        let decoded = Frame::decode(&mut buf).unwrap().unwrap();

        assert_eq!(decoded.version, PROTOCOL_VERSION);
        assert_eq!(decoded.kind(), Some(MsgType::Ping));
        assert_eq!(decoded.flags, 0x1234);
        assert_eq!(decoded.seq, 42);
        assert_eq!(decoded.payload, payload);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_header_layout() {
        // PING, seq=42, flags=0x1234, payload = 0x00..0x1F
        let frame = Frame::new(MsgType::Ping, 42, counting_payload(32)).with_flags(0x1234);
        let encoded = frame.encode().unwrap();

        assert_eq!(
            &encoded[..16],
            &[
                0x53, 0x46, 0x4C, 0x57, // "SFLW"
                0x01, 0x01, // version, type
                0x12, 0x34, // flags
                0x00, 0x00, 0x00, 0x2A, // seq
                0x00, 0x00, 0x00, 0x20, // payload_len
            ]
        );
        // crc32 of 0x00..0x1F
        assert_eq!(&encoded[16..20], &[0x91, 0x26, 0x7E, 0x8A]);
    }

    #[test]
    fn test_empty_payload_crc_is_zero() {
        let frame = Frame::new(MsgType::GetStats, 1, Bytes::new());
        let encoded = frame.encode().unwrap();
        assert_eq!(encoded.len(), FRAME_HEADER_SIZE);
        assert_eq!(&encoded[16..20], &[0, 0, 0, 0]);

        let mut buf = encoded;
        let decoded = Frame::decode(&mut buf).unwrap().unwrap();
        assert!(decoded.payload.is_empty());
    }

    #[test]
    fn test_crc_detects_bit_flips() {
        let frame = Frame::new(MsgType::Echo, 7, Bytes::from_static(b"hello sflw"));
        let encoded = frame.encode().unwrap();

        for bit in 0..(frame.payload.len() * 8) {
            let mut corrupted = encoded.clone();
            corrupted[FRAME_HEADER_SIZE + bit / 8] ^= 1 << (bit % 8);
            let result = Frame::decode(&mut corrupted);
            assert!(
                matches!(result, Err(ProtocolError::CrcMismatch { .. })),
                "flip of payload bit {bit} went undetected"
            );
        }
    }

    #[test]
    fn test_invalid_magic() {
        let mut buf = BytesMut::zeroed(FRAME_HEADER_SIZE);
        buf[..4].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        let result = Frame::decode(&mut buf);
        assert!(matches!(result, Err(ProtocolError::InvalidMagic(_))));
    }

    #[test]
    fn test_unsupported_version() {
        let frame = Frame::new(MsgType::Ping, 1, Bytes::new());
        let mut encoded = frame.encode().unwrap();
        encoded[4] = 99;
        let result = Frame::decode(&mut encoded);
        assert!(matches!(result, Err(ProtocolError::UnsupportedVersion(99))));
    }

    #[test]
    fn test_incomplete_header() {
        let mut buf = BytesMut::from(&b"SFLW\x01\x01"[..]);
        assert!(Frame::decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 6);
    }

    #[test]
    fn test_incomplete_payload() {
        let frame = Frame::new(MsgType::Echo, 3, Bytes::from_static(b"partial"));
        let encoded = frame.encode().unwrap();

        let mut buf = BytesMut::from(&encoded[..encoded.len() - 1]);
        assert!(Frame::decode(&mut buf).unwrap().is_none());
        // Nothing consumed while waiting
        assert_eq!(buf.len(), encoded.len() - 1);
    }

    #[test]
    fn test_oversize_payload_len_is_corrupt() {
        let frame = Frame::new(MsgType::Ping, 1, Bytes::new());
        let mut encoded = frame.encode().unwrap();
        // Claim one byte more than the receive buffer can ever hold
        let oversize = (MAX_FRAME_PAYLOAD as u32 + 1).to_be_bytes();
        encoded[12..16].copy_from_slice(&oversize);

        let result = Frame::decode(&mut encoded);
        assert!(matches!(result, Err(ProtocolError::FrameTooLarge { .. })));
    }

    #[test]
    fn test_encode_rejects_oversize_payload() {
        let huge = Bytes::from(vec![0u8; MAX_ENCODE_PAYLOAD + 1]);
        let frame = Frame::new(MsgType::Echo, 1, huge);
        assert!(matches!(
            frame.encode(),
            Err(ProtocolError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_multiple_frames_in_buffer() {
        let f1 = Frame::new(MsgType::Ping, 1, Bytes::from_static(b"one"));
        let f2 = Frame::new(MsgType::Echo, 2, Bytes::from_static(b"two"));

        let mut buf = BytesMut::new();
        buf.extend_from_slice(&f1.encode().unwrap());
        buf.extend_from_slice(&f2.encode().unwrap());

        let d1 = Frame::decode(&mut buf).unwrap().unwrap();
        assert_eq!(d1.seq, 1);
        assert_eq!(d1.payload.as_ref(), b"one");

        let d2 = Frame::decode(&mut buf).unwrap().unwrap();
        assert_eq!(d2.seq, 2);
        assert_eq!(d2.payload.as_ref(), b"two");

        assert!(buf.is_empty());
    }

    #[test]
    fn test_crc_known_vectors() {
        assert_eq!(crc32fast::hash(b""), 0);
        assert_eq!(crc32fast::hash(b"123456789"), 0xCBF4_3926);
    }
}
