//! # sentryflow-client
//!
//! Async client for the SentryFlow SFLW protocol.
//!
//! This crate provides:
//! - A framed connection with one request in flight at a time
//! - Typed operations: ping, echo, stats, route update, route lookup

pub mod client;
pub mod connection;
pub mod error;

pub use client::Client;
pub use connection::{Connection, ConnectionConfig};
pub use error::ClientError;
