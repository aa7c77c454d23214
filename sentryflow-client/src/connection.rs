//! Connection management.

use crate::error::ClientError;
use bytes::Bytes;
use sentryflow_protocol::{Decoder, Frame, MsgType};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Read buffer size for socket reads (8 KiB).
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server address.
    pub addr: SocketAddr,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// A connection to a SentryFlow server.
///
/// The protocol is strict request/reply with FIFO ordering, so the
/// connection keeps exactly one request in flight and reads its reply
/// before returning.
pub struct Connection {
    stream: TcpStream,
    decoder: Decoder,
    next_seq: u32,
    request_timeout: Duration,
}

impl Connection {
    /// Connects to the server.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, ClientError> {
        tracing::debug!("connecting to {}", config.addr);
        let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(config.addr))
            .await
            .map_err(|_| ClientError::Timeout)??;
        stream.set_nodelay(true).ok();

        Ok(Self {
            stream,
            decoder: Decoder::new(),
            next_seq: 1,
            request_timeout: config.request_timeout,
        })
    }

    /// Sends one request frame and reads its reply.
    ///
    /// The reply's sequence number must echo the request's.
    pub async fn request(&mut self, msg_type: MsgType, payload: Bytes) -> Result<Frame, ClientError> {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);

        let encoded = Frame::new(msg_type, seq, payload).encode()?;
        tracing::debug!(
            "sending {} (seq={}, {} bytes)",
            MsgType::name(msg_type as u8),
            seq,
            encoded.len()
        );
        self.stream.write_all(&encoded).await?;

        let reply = tokio::time::timeout(self.request_timeout, self.read_frame())
            .await
            .map_err(|_| ClientError::Timeout)??;

        if reply.seq != seq {
            return Err(ClientError::SeqMismatch {
                sent: seq,
                got: reply.seq,
            });
        }
        Ok(reply)
    }

    /// Reads from the socket until one frame decodes.
    async fn read_frame(&mut self) -> Result<Frame, ClientError> {
        let mut buf = [0u8; READ_BUFFER_SIZE];
        loop {
            if let Some(frame) = self.decoder.decode_frame()? {
                tracing::debug!(
                    "received {} (seq={})",
                    MsgType::name(frame.msg_type),
                    frame.seq
                );
                return Ok(frame);
            }

            let n = self.stream.read(&mut buf).await?;
            if n == 0 {
                return Err(ClientError::ConnectionClosed);
            }
            self.decoder.extend(&buf[..n])?;
        }
    }

    /// Shuts the connection down.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
