//! sentryflowd - SentryFlow router daemon
//!
//! A single-threaded TCP server speaking the SFLW binary protocol with an
//! in-memory IPv4 routing table.

use sentryflow_server::{Config, Server};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if std::env::args().any(|arg| arg == "--self-test") {
        return self_test();
    }

    // Load configuration (from file if SENTRYFLOW_CONFIG is set, then env overrides)
    let config = match Config::load() {
        Ok(c) => {
            if let Ok(path) = std::env::var("SENTRYFLOW_CONFIG") {
                tracing::info!("Loaded config from {}", path);
            }
            c
        }
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            return Err(e.into());
        }
    };

    tracing::info!("Starting SentryFlow server");
    tracing::info!("  Bind address: {}", config.network.bind_addr);
    tracing::info!("  Strategy: {:?}", config.routing.strategy);
    match config.network.idle_timeout() {
        Some(timeout) => tracing::info!("  Idle timeout: {:?}", timeout),
        None => tracing::info!("  Idle timeout: disabled"),
    }

    let server = Server::bind(&config)?;

    // Runs until ctrl-c
    server.run().await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Framing and routing smoke checks, runnable on a deployed binary.
fn self_test() -> Result<(), Box<dyn std::error::Error>> {
    use bytes::Bytes;
    use sentryflow_protocol::{Frame, MsgType};
    use sentryflow_routing::{RouteEntry, RouteTable};
    use std::net::Ipv4Addr;

    // Frame round-trip
    let payload: Bytes = (0u8..32).collect::<Vec<u8>>().into();
    let frame = Frame::new(MsgType::Ping, 42, payload.clone()).with_flags(0x1234);
    let mut encoded = frame.encode()?;
    let decoded = Frame::decode(&mut encoded)?.ok_or("framing self-test: incomplete decode")?;
    if decoded.seq != 42 || decoded.flags != 0x1234 || decoded.payload != payload {
        return Err("framing self-test: round-trip mismatch".into());
    }
    if !encoded.is_empty() {
        return Err("framing self-test: leftover bytes".into());
    }

    // Routing table LPM
    let mut table = RouteTable::new();
    table.upsert(RouteEntry {
        prefix: Ipv4Addr::new(10, 0, 0, 0),
        mask_bits: 8,
        metric: 10,
        next_hop: Ipv4Addr::new(10, 0, 0, 1),
        last_updated_ms: 0,
    })?;
    table.upsert(RouteEntry {
        prefix: Ipv4Addr::new(10, 1, 0, 0),
        mask_bits: 16,
        metric: 5,
        next_hop: Ipv4Addr::new(10, 1, 0, 1),
        last_updated_ms: 0,
    })?;

    let best = table
        .lookup(Ipv4Addr::new(10, 1, 2, 3))
        .ok_or("routing self-test: expected a match")?;
    if best.mask_bits != 16 {
        return Err("routing self-test: wrong longest-prefix match".into());
    }
    if table.lookup(Ipv4Addr::new(11, 0, 0, 1)).is_some() {
        return Err("routing self-test: unexpected match".into());
    }

    println!("sentryflowd self-test: OK");
    Ok(())
}
