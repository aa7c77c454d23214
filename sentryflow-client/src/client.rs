//! High-level client API.

use crate::connection::{Connection, ConnectionConfig};
use crate::error::ClientError;
use bytes::Bytes;
use sentryflow_protocol::message::{encode_route_records, RouteRecord};
use sentryflow_protocol::{Frame, MsgType, RouteReply, StatsSnapshot};
use std::net::{Ipv4Addr, SocketAddr};

/// High-level client for SentryFlow.
pub struct Client {
    conn: Connection,
}

impl Client {
    /// Connects with default timeouts.
    pub async fn connect(addr: SocketAddr) -> Result<Self, ClientError> {
        Self::connect_with(ConnectionConfig::new(addr)).await
    }

    /// Connects with the given configuration.
    pub async fn connect_with(config: ConnectionConfig) -> Result<Self, ClientError> {
        Ok(Self {
            conn: Connection::connect(&config).await?,
        })
    }

    /// Closes the connection.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        self.conn.close().await
    }

    /// Sends a raw request and returns whatever reply frame comes back,
    /// including ERROR frames.
    pub async fn request_raw(
        &mut self,
        msg_type: MsgType,
        payload: Bytes,
    ) -> Result<Frame, ClientError> {
        self.conn.request(msg_type, payload).await
    }

    async fn request(
        &mut self,
        msg_type: MsgType,
        expected_reply: MsgType,
        payload: Bytes,
    ) -> Result<Frame, ClientError> {
        let reply = self.conn.request(msg_type, payload).await?;
        match reply.kind() {
            Some(t) if t == expected_reply => Ok(reply),
            Some(MsgType::Error) => Err(ClientError::Server(
                String::from_utf8_lossy(&reply.payload).into_owned(),
            )),
            _ => Err(ClientError::UnexpectedReply {
                expected: MsgType::name(expected_reply as u8),
                got: MsgType::name(reply.msg_type),
            }),
        }
    }

    /// Pings the server; returns the echoed payload.
    pub async fn ping(&mut self, payload: &[u8]) -> Result<Bytes, ClientError> {
        let reply = self
            .request(MsgType::Ping, MsgType::Pong, Bytes::copy_from_slice(payload))
            .await?;
        Ok(reply.payload)
    }

    /// Echoes a payload off the server.
    pub async fn echo(&mut self, payload: &[u8]) -> Result<Bytes, ClientError> {
        let reply = self
            .request(
                MsgType::Echo,
                MsgType::EchoReply,
                Bytes::copy_from_slice(payload),
            )
            .await?;
        Ok(reply.payload)
    }

    /// Fetches server statistics.
    pub async fn stats(&mut self) -> Result<StatsSnapshot, ClientError> {
        let reply = self
            .request(MsgType::GetStats, MsgType::StatsReply, Bytes::new())
            .await?;
        Ok(StatsSnapshot::decode(&reply.payload)?)
    }

    /// Submits route records; returns how many the server installed.
    pub async fn route_update(&mut self, records: &[RouteRecord]) -> Result<u32, ClientError> {
        let reply = self
            .request(
                MsgType::RouteUpdate,
                MsgType::RouteAck,
                encode_route_records(records),
            )
            .await?;
        if reply.payload.len() < 4 {
            return Err(ClientError::Protocol(
                sentryflow_protocol::ProtocolError::ShortPayload {
                    what: "route ack",
                    needed: 4,
                    got: reply.payload.len(),
                },
            ));
        }
        let p = &reply.payload;
        Ok(u32::from_be_bytes([p[0], p[1], p[2], p[3]]))
    }

    /// Looks up the best route for an address; `None` when no route matches.
    pub async fn route_lookup(&mut self, ip: Ipv4Addr) -> Result<Option<RouteReply>, ClientError> {
        let reply = self
            .request(
                MsgType::RouteLookup,
                MsgType::RouteReply,
                Bytes::copy_from_slice(&ip.octets()),
            )
            .await?;
        Ok(RouteReply::decode(&reply.payload)?.found())
    }
}
