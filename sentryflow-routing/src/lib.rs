//! # sentryflow-routing
//!
//! In-memory IPv4 routing table for SentryFlow.
//!
//! This crate provides:
//! - A fixed-capacity prefix store with upsert/remove and pure
//!   longest-prefix-match lookup
//! - The routing strategy knob and hop-count decision derived from it

pub mod decision;
pub mod table;

pub use decision::{decide, RouteDecision, Strategy};
pub use table::{RouteEntry, RouteTable, RouteTableError, ROUTE_TABLE_CAPACITY};
