//! Message dispatch: one reply frame per decoded request.

use crate::clock::Clock;
use crate::stats::RequestStats;
use bytes::Bytes;
use sentryflow_protocol::message::{
    route_records, ERR_BAD_PAYLOAD, ERR_UNKNOWN_TYPE, MAX_ECHO_PAYLOAD,
};
use sentryflow_protocol::{Frame, MsgType, RouteReply};
use sentryflow_routing::{decide, RouteEntry, RouteTable, Strategy};
use std::net::Ipv4Addr;

/// Mutable state shared by all connections on the event-loop thread.
#[derive(Debug, Default)]
pub struct RouterState {
    pub table: RouteTable,
    pub stats: RequestStats,
}

impl RouterState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Produces exactly one reply frame for each decoded request.
///
/// The dispatcher owns no I/O and never blocks; it reads and mutates
/// [`RouterState`] synchronously. Recording the request itself into the
/// stats is the caller's job and happens after the reply is built, so a
/// GET_STATS reply reports the state prior to its own request.
pub struct Dispatcher {
    clock: Clock,
    strategy: Strategy,
}

impl Dispatcher {
    pub fn new(clock: Clock, strategy: Strategy) -> Self {
        Self { clock, strategy }
    }

    /// Handles one request frame and returns its reply.
    ///
    /// Replies carry version 1, zero flags and the request's sequence number.
    pub fn dispatch(&self, state: &mut RouterState, request: &Frame) -> Frame {
        match request.kind() {
            Some(MsgType::Ping) => self.echo_reply(MsgType::Pong, request),
            Some(MsgType::Echo) => self.echo_reply(MsgType::EchoReply, request),
            Some(MsgType::GetStats) => {
                let snapshot = state.stats.snapshot(self.clock.now_ms());
                Frame::new(MsgType::StatsReply, request.seq, snapshot.encode())
            }
            Some(MsgType::RouteUpdate) => self.handle_route_update(state, request),
            Some(MsgType::RouteLookup) => self.handle_route_lookup(state, request),
            _ => error_reply(request.seq, ERR_UNKNOWN_TYPE),
        }
    }

    fn echo_reply(&self, reply_type: MsgType, request: &Frame) -> Frame {
        let len = request.payload.len().min(MAX_ECHO_PAYLOAD);
        Frame::new(reply_type, request.seq, request.payload.slice(..len))
    }

    fn handle_route_update(&self, state: &mut RouterState, request: &Frame) -> Frame {
        let mut installed: u32 = 0;
        for record in route_records(&request.payload) {
            let entry = RouteEntry {
                prefix: record.prefix,
                mask_bits: record.mask_bits,
                metric: record.metric,
                next_hop: record.next_hop,
                last_updated_ms: self.clock.timestamp_ms(),
            };
            match state.table.upsert(entry) {
                Ok(()) => {
                    installed += 1;
                    state.stats.record_route_installed();
                }
                Err(e) => {
                    tracing::debug!(prefix = %record.prefix, mask = record.mask_bits, "route record skipped: {e}");
                }
            }
        }
        Frame::new(
            MsgType::RouteAck,
            request.seq,
            Bytes::copy_from_slice(&installed.to_be_bytes()),
        )
    }

    fn handle_route_lookup(&self, state: &mut RouterState, request: &Frame) -> Frame {
        if request.payload.len() < 4 {
            return error_reply(request.seq, ERR_BAD_PAYLOAD);
        }
        let p = &request.payload;
        let ip = Ipv4Addr::new(p[0], p[1], p[2], p[3]);

        let best = state.table.lookup(ip);
        let decision = decide(self.strategy, best);
        tracing::debug!(
            %ip,
            hops = decision.hops,
            matched_bits = decision.matched_prefix_bits,
            "route decision"
        );

        let reply = match best {
            Some(entry) => RouteReply {
                mask_bits: entry.mask_bits,
                metric: entry.metric,
                next_hop: entry.next_hop,
            },
            None => RouteReply::NO_ROUTE,
        };
        Frame::new(MsgType::RouteReply, request.seq, reply.encode())
    }
}

fn error_reply(seq: u32, message: &'static str) -> Frame {
    Frame::new(MsgType::Error, seq, Bytes::from_static(message.as_bytes()))
}
