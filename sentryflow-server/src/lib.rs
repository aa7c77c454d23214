//! # sentryflow-server
//!
//! Single-threaded TCP server for the SFLW protocol.
//!
//! This crate provides:
//! - Non-blocking connection handling on a current-thread runtime
//! - Protocol framing and message dispatch
//! - The in-memory routing table and process-wide request statistics
//! - Layered configuration (defaults, YAML file, environment)

pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod server;
pub mod stats;

pub use clock::Clock;
pub use config::{Config, ConfigError, NetworkConfig, RoutingConfig};
pub use dispatch::{Dispatcher, RouterState};
pub use error::ServerError;
pub use server::Server;
pub use stats::RequestStats;
