//! TCP server implementation.
//!
//! Single-threaded cooperative model: every connection is a task on the same
//! thread (`spawn_local`), all sockets are non-blocking under the runtime's
//! readiness loop, and shared state is plain `Rc<RefCell<..>>` with no locks.

use crate::clock::Clock;
use crate::config::Config;
use crate::dispatch::{Dispatcher, RouterState};
use crate::error::ServerError;
use sentryflow_protocol::{Decoder, MsgType, RECV_BUFFER_CAPACITY};
use std::cell::{Cell, RefCell};
use std::net::SocketAddr;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};

/// Listen backlog for the server socket.
const LISTEN_BACKLOG: u32 = 16;

/// TCP server for SentryFlow.
pub struct Server {
    listener: TcpListener,
    state: Rc<RefCell<RouterState>>,
    dispatcher: Rc<Dispatcher>,
    idle_timeout: Option<Duration>,
    max_connections: usize,
}

impl Server {
    /// Binds the server socket (SO_REUSEADDR, backlog 16) and captures the
    /// monotonic clock anchor.
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind(config: &Config) -> Result<Self, ServerError> {
        let addr = config.network.bind_addr;
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        let listener = socket.listen(LISTEN_BACKLOG)?;

        let clock = Clock::start();
        Ok(Self {
            listener,
            state: Rc::new(RefCell::new(RouterState::new())),
            dispatcher: Rc::new(Dispatcher::new(clock, config.routing.strategy)),
            idle_timeout: config.network.idle_timeout(),
            max_connections: config.network.max_connections,
        })
    }

    /// Returns the bound address.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Runs the server until ctrl-c.
    pub async fn run(self) -> Result<(), ServerError> {
        let local = tokio::task::LocalSet::new();
        local.run_until(self.serve()).await
    }

    /// Accept loop. Must run inside a `LocalSet`.
    pub async fn serve(self) -> Result<(), ServerError> {
        tracing::info!("server listening on {}", self.local_addr()?);

        let active = Rc::new(Cell::new(0usize));
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = self.listener.accept() => match result {
                    Ok((stream, peer)) => {
                        if active.get() >= self.max_connections {
                            tracing::warn!("connection limit reached, rejecting {}", peer);
                            continue;
                        }
                        active.set(active.get() + 1);
                        tracing::info!("client connected: {}", peer);

                        let state = self.state.clone();
                        let dispatcher = self.dispatcher.clone();
                        let idle_timeout = self.idle_timeout;
                        let active = active.clone();
                        tokio::task::spawn_local(async move {
                            if let Err(e) =
                                handle_connection(stream, peer, state, dispatcher, idle_timeout).await
                            {
                                tracing::debug!("[{}] connection error: {}", peer, e);
                            }
                            active.set(active.get() - 1);
                            tracing::info!("client disconnected: {}", peer);
                        });
                    }
                    Err(e) => {
                        tracing::error!("accept error: {}", e);
                    }
                },
                _ = &mut shutdown => {
                    tracing::info!("shutdown signal received");
                    return Ok(());
                }
            }
        }
    }
}

/// Per-connection read/dispatch/write loop.
///
/// Frames are dispatched in arrival order and each reply is fully written
/// before the next buffered frame is decoded, so replies are strict FIFO and
/// at most one is in flight per connection.
async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    state: Rc<RefCell<RouterState>>,
    dispatcher: Rc<Dispatcher>,
    idle_timeout: Option<Duration>,
) -> Result<(), ServerError> {
    let mut decoder = Decoder::new();
    let mut buf = [0u8; RECV_BUFFER_CAPACITY];

    loop {
        let n = match idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, stream.read(&mut buf)).await {
                Ok(result) => result?,
                Err(_) => {
                    tracing::debug!("[{}] idle timeout", peer);
                    return Ok(());
                }
            },
            None => stream.read(&mut buf).await?,
        };
        if n == 0 {
            tracing::debug!("[{}] closed by peer", peer);
            return Ok(());
        }

        if let Err(e) = decoder.extend(&buf[..n]) {
            // The peer outran the bounded receive buffer. Not a framing
            // error, so bad_frames stays untouched.
            tracing::debug!("[{}] {}", peer, e);
            return Ok(());
        }

        loop {
            let request = match decoder.decode_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    state.borrow_mut().stats.record_bad_frame();
                    tracing::debug!("[{}] bad frame: {}", peer, e);
                    return Ok(());
                }
            };

            tracing::debug!(
                "[{}] request {} (seq={}, {} bytes)",
                peer,
                MsgType::name(request.msg_type),
                request.seq,
                request.payload.len()
            );

            let started = Instant::now();
            let reply = {
                let mut state = state.borrow_mut();
                dispatcher.dispatch(&mut state, &request)
            };
            let latency_ms = started.elapsed().as_secs_f64() * 1e3;
            state.borrow_mut().stats.record_request(latency_ms);

            let encoded = reply.encode()?;
            stream.write_all(&encoded).await?;
        }
    }
}
