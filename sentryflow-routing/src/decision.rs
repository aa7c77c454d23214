//! Routing strategy knob and the hop-count decision derived from it.
//!
//! The strategy is a configuration value only; no wire operation exposes the
//! decision. The server computes it per lookup for observability.

use crate::table::RouteEntry;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// How the router models the path to a destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// One hop to everything.
    #[default]
    Direct,
    /// Derive a synthetic hop count from the route metric.
    SimulatedHop,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Self::Direct),
            "simulated_hop" => Ok(Self::SimulatedHop),
            other => Err(format!("unknown strategy '{other}'")),
        }
    }
}

/// Outcome of routing a destination under a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDecision {
    pub strategy: Strategy,
    pub hops: u8,
    pub matched_prefix_bits: u8,
    pub metric: u16,
    pub next_hop: Ipv4Addr,
}

/// Derives a decision from a lookup result.
///
/// Direct always reports one hop. SimulatedHop stretches the hop count with
/// the metric on a match (1 + metric/5, at least 1) and assumes three hops on
/// a miss. A miss carries the no-route metric sentinel.
pub fn decide(strategy: Strategy, best: Option<&RouteEntry>) -> RouteDecision {
    match best {
        Some(entry) => {
            let hops = match strategy {
                Strategy::Direct => 1,
                Strategy::SimulatedHop => (1 + entry.metric / 5).min(u8::MAX as u16) as u8,
            };
            RouteDecision {
                strategy,
                hops,
                matched_prefix_bits: entry.mask_bits,
                metric: entry.metric,
                next_hop: entry.next_hop,
            }
        }
        None => RouteDecision {
            strategy,
            hops: match strategy {
                Strategy::Direct => 1,
                Strategy::SimulatedHop => 3,
            },
            matched_prefix_bits: 0,
            metric: 0xFFFF,
            next_hop: Ipv4Addr::UNSPECIFIED,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(metric: u16) -> RouteEntry {
        RouteEntry {
            prefix: Ipv4Addr::new(10, 0, 0, 0),
            mask_bits: 8,
            metric,
            next_hop: Ipv4Addr::new(10, 0, 0, 1),
            last_updated_ms: 0,
        }
    }

    #[test]
    fn test_direct_is_always_one_hop() {
        assert_eq!(decide(Strategy::Direct, Some(&matched(100))).hops, 1);
        assert_eq!(decide(Strategy::Direct, None).hops, 1);
    }

    #[test]
    fn test_simulated_hop_scales_with_metric() {
        assert_eq!(decide(Strategy::SimulatedHop, Some(&matched(0))).hops, 1);
        assert_eq!(decide(Strategy::SimulatedHop, Some(&matched(10))).hops, 3);
        assert_eq!(decide(Strategy::SimulatedHop, Some(&matched(25))).hops, 6);
    }

    #[test]
    fn test_simulated_hop_miss_assumes_three() {
        let decision = decide(Strategy::SimulatedHop, None);
        assert_eq!(decision.hops, 3);
        assert_eq!(decision.metric, 0xFFFF);
        assert_eq!(decision.matched_prefix_bits, 0);
        assert!(decision.next_hop.is_unspecified());
    }

    #[test]
    fn test_decision_carries_route_fields() {
        let decision = decide(Strategy::Direct, Some(&matched(7)));
        assert_eq!(decision.matched_prefix_bits, 8);
        assert_eq!(decision.metric, 7);
        assert_eq!(decision.next_hop, Ipv4Addr::new(10, 0, 0, 1));
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("direct".parse::<Strategy>().unwrap(), Strategy::Direct);
        assert_eq!(
            "simulated_hop".parse::<Strategy>().unwrap(),
            Strategy::SimulatedHop
        );
        assert!("mesh".parse::<Strategy>().is_err());
    }
}
