//! Message-type registry and fixed binary payload codecs.

use crate::error::ProtocolError;
use bytes::{BufMut, Bytes, BytesMut};
use std::net::Ipv4Addr;

/// SFLW message types.
///
/// Requests are odd-numbered, their replies follow at the next value;
/// ERROR replies any request the server cannot interpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MsgType {
    Ping = 1,
    Pong = 2,
    Echo = 3,
    EchoReply = 4,
    GetStats = 5,
    StatsReply = 6,
    RouteUpdate = 7,
    RouteAck = 8,
    RouteLookup = 9,
    RouteReply = 10,
    Error = 255,
}

impl MsgType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Ping),
            2 => Some(Self::Pong),
            3 => Some(Self::Echo),
            4 => Some(Self::EchoReply),
            5 => Some(Self::GetStats),
            6 => Some(Self::StatsReply),
            7 => Some(Self::RouteUpdate),
            8 => Some(Self::RouteAck),
            9 => Some(Self::RouteLookup),
            10 => Some(Self::RouteReply),
            255 => Some(Self::Error),
            _ => None,
        }
    }

    /// Human-readable name for logging.
    pub fn name(value: u8) -> &'static str {
        match Self::from_u8(value) {
            Some(Self::Ping) => "PING",
            Some(Self::Pong) => "PONG",
            Some(Self::Echo) => "ECHO",
            Some(Self::EchoReply) => "ECHO_REPLY",
            Some(Self::GetStats) => "GET_STATS",
            Some(Self::StatsReply) => "STATS_REPLY",
            Some(Self::RouteUpdate) => "ROUTE_UPDATE",
            Some(Self::RouteAck) => "ROUTE_ACK",
            Some(Self::RouteLookup) => "ROUTE_LOOKUP",
            Some(Self::RouteReply) => "ROUTE_REPLY",
            Some(Self::Error) => "ERROR",
            None => "UNKNOWN",
        }
    }
}

/// ERROR payload for a request type the server does not understand.
pub const ERR_UNKNOWN_TYPE: &str = "unknown message type";

/// ERROR payload for a request whose payload is too short to interpret.
pub const ERR_BAD_PAYLOAD: &str = "bad payload";

/// PONG/ECHO_REPLY payloads are truncated to this many bytes.
pub const MAX_ECHO_PAYLOAD: usize = 2048;

/// Size of one ROUTE_UPDATE record on the wire.
pub const ROUTE_RECORD_SIZE: usize = 16;

/// One route record in a ROUTE_UPDATE payload.
///
/// Wire layout (16 bytes, big-endian): prefix u32, mask_bits u8, reserved u8,
/// metric u16, next_hop u32, reserved u32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRecord {
    pub prefix: Ipv4Addr,
    pub mask_bits: u8,
    pub metric: u16,
    pub next_hop: Ipv4Addr,
}

impl RouteRecord {
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_u32(u32::from(self.prefix));
        buf.put_u8(self.mask_bits);
        buf.put_u8(0);
        buf.put_u16(self.metric);
        buf.put_u32(u32::from(self.next_hop));
        buf.put_u32(0);
    }

    fn decode(chunk: &[u8]) -> Self {
        debug_assert_eq!(chunk.len(), ROUTE_RECORD_SIZE);
        Self {
            prefix: u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]).into(),
            mask_bits: chunk[4],
            metric: u16::from_be_bytes([chunk[6], chunk[7]]),
            next_hop: u32::from_be_bytes([chunk[8], chunk[9], chunk[10], chunk[11]]).into(),
        }
    }
}

/// Iterates the whole records in a ROUTE_UPDATE payload.
///
/// A trailing partial record (fewer than 16 bytes) is ignored.
pub fn route_records(payload: &[u8]) -> impl Iterator<Item = RouteRecord> + '_ {
    payload.chunks_exact(ROUTE_RECORD_SIZE).map(RouteRecord::decode)
}

/// Encodes a slice of records into a ROUTE_UPDATE payload.
pub fn encode_route_records(records: &[RouteRecord]) -> Bytes {
    let mut buf = BytesMut::with_capacity(records.len() * ROUTE_RECORD_SIZE);
    for record in records {
        record.encode_into(&mut buf);
    }
    buf.freeze()
}

/// Size of the STATS_REPLY payload on the wire.
pub const STATS_PAYLOAD_SIZE: usize = 40;

/// Server statistics as carried in a STATS_REPLY payload.
///
/// Wire layout (40 bytes, big-endian): total_requests u64, bad_frames u64,
/// routes_installed u64, uptime_ms u64, last_latency_us u32,
/// avg_latency_us u32.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub bad_frames: u64,
    pub routes_installed: u64,
    pub uptime_ms: u64,
    pub last_latency_us: u32,
    pub avg_latency_us: u32,
}

impl StatsSnapshot {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(STATS_PAYLOAD_SIZE);
        buf.put_u64(self.total_requests);
        buf.put_u64(self.bad_frames);
        buf.put_u64(self.routes_installed);
        buf.put_u64(self.uptime_ms);
        buf.put_u32(self.last_latency_us);
        buf.put_u32(self.avg_latency_us);
        buf.freeze()
    }

    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() < STATS_PAYLOAD_SIZE {
            return Err(ProtocolError::ShortPayload {
                what: "stats",
                needed: STATS_PAYLOAD_SIZE,
                got: payload.len(),
            });
        }
        let u64_at = |off: usize| {
            u64::from_be_bytes(payload[off..off + 8].try_into().unwrap())
        };
        Ok(Self {
            total_requests: u64_at(0),
            bad_frames: u64_at(8),
            routes_installed: u64_at(16),
            uptime_ms: u64_at(24),
            last_latency_us: u32::from_be_bytes(payload[32..36].try_into().unwrap()),
            avg_latency_us: u32::from_be_bytes(payload[36..40].try_into().unwrap()),
        })
    }
}

/// Size of the ROUTE_REPLY payload on the wire.
pub const ROUTE_REPLY_SIZE: usize = 8;

/// The result of a ROUTE_LOOKUP as carried in a ROUTE_REPLY payload.
///
/// Wire layout (8 bytes, big-endian): mask_bits u8, reserved u8, metric u16,
/// next_hop u32. "No route" is the sentinel mask 0 / metric 0xFFFF /
/// next hop 0.0.0.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteReply {
    pub mask_bits: u8,
    pub metric: u16,
    pub next_hop: Ipv4Addr,
}

impl RouteReply {
    pub const NO_ROUTE: RouteReply = RouteReply {
        mask_bits: 0,
        metric: 0xFFFF,
        next_hop: Ipv4Addr::UNSPECIFIED,
    };

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(ROUTE_REPLY_SIZE);
        buf.put_u8(self.mask_bits);
        buf.put_u8(0);
        buf.put_u16(self.metric);
        buf.put_u32(u32::from(self.next_hop));
        buf.freeze()
    }

    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() < ROUTE_REPLY_SIZE {
            return Err(ProtocolError::ShortPayload {
                what: "route reply",
                needed: ROUTE_REPLY_SIZE,
                got: payload.len(),
            });
        }
        Ok(Self {
            mask_bits: payload[0],
            metric: u16::from_be_bytes([payload[2], payload[3]]),
            next_hop: u32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]).into(),
        })
    }

    /// Returns `None` for the no-route sentinel.
    pub fn found(self) -> Option<Self> {
        if self.metric == 0xFFFF || self.next_hop.is_unspecified() {
            None
        } else {
            Some(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msg_type_roundtrip() {
        for value in [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 255] {
            let t = MsgType::from_u8(value).unwrap();
            assert_eq!(t as u8, value);
        }
        assert_eq!(MsgType::from_u8(0), None);
        assert_eq!(MsgType::from_u8(42), None);
    }

    #[test]
    fn test_msg_type_names() {
        assert_eq!(MsgType::name(1), "PING");
        assert_eq!(MsgType::name(10), "ROUTE_REPLY");
        assert_eq!(MsgType::name(255), "ERROR");
        assert_eq!(MsgType::name(42), "UNKNOWN");
    }

    #[test]
    fn test_route_record_layout() {
        let record = RouteRecord {
            prefix: Ipv4Addr::new(10, 0, 0, 0),
            mask_bits: 8,
            metric: 10,
            next_hop: Ipv4Addr::new(10, 0, 0, 1),
        };
        let payload = encode_route_records(&[record]);
        assert_eq!(
            payload.as_ref(),
            &[
                0x0A, 0x00, 0x00, 0x00, // prefix
                0x08, 0x00, // mask, reserved
                0x00, 0x0A, // metric
                0x0A, 0x00, 0x00, 0x01, // next hop
                0x00, 0x00, 0x00, 0x00, // reserved
            ]
        );

        let decoded: Vec<_> = route_records(&payload).collect();
        assert_eq!(decoded, vec![record]);
    }

    #[test]
    fn test_route_records_ignore_trailing_partial() {
        let record = RouteRecord {
            prefix: Ipv4Addr::new(192, 168, 0, 0),
            mask_bits: 24,
            metric: 1,
            next_hop: Ipv4Addr::new(192, 168, 0, 1),
        };
        let mut payload = encode_route_records(&[record]).to_vec();
        payload.extend_from_slice(&[0xAA; 15]);

        assert_eq!(route_records(&payload).count(), 1);
    }

    #[test]
    fn test_stats_snapshot_roundtrip() {
        let snapshot = StatsSnapshot {
            total_requests: 1234,
            bad_frames: 5,
            routes_installed: 17,
            uptime_ms: 98765,
            last_latency_us: 250,
            avg_latency_us: 310,
        };
        let payload = snapshot.encode();
        assert_eq!(payload.len(), STATS_PAYLOAD_SIZE);
        assert_eq!(StatsSnapshot::decode(&payload).unwrap(), snapshot);
    }

    #[test]
    fn test_stats_snapshot_rejects_short_payload() {
        assert!(matches!(
            StatsSnapshot::decode(&[0u8; 39]),
            Err(ProtocolError::ShortPayload { .. })
        ));
    }

    #[test]
    fn test_route_reply_layout() {
        // mask=16, metric=5, nh=10.1.0.1
        let reply = RouteReply {
            mask_bits: 16,
            metric: 5,
            next_hop: Ipv4Addr::new(10, 1, 0, 1),
        };
        let payload = reply.encode();
        assert_eq!(
            payload.as_ref(),
            &[0x10, 0x00, 0x00, 0x05, 0x0A, 0x01, 0x00, 0x01]
        );
        assert_eq!(RouteReply::decode(&payload).unwrap(), reply);
        assert!(reply.found().is_some());
    }

    #[test]
    fn test_route_reply_no_route_sentinel() {
        let payload = RouteReply::NO_ROUTE.encode();
        let decoded = RouteReply::decode(&payload).unwrap();
        assert_eq!(decoded, RouteReply::NO_ROUTE);
        assert!(decoded.found().is_none());
    }
}
