//! Process-wide request statistics.

use sentryflow_protocol::StatsSnapshot;

/// Counters accumulated across all connections.
///
/// Latencies are tracked internally in fractional milliseconds and converted
/// to microseconds (truncating) when snapshotted onto the wire.
#[derive(Debug, Clone, Default)]
pub struct RequestStats {
    total_requests: u64,
    bad_frames: u64,
    routes_installed: u64,
    last_latency_ms: f64,
    avg_latency_ms: f64,
}

impl RequestStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one successfully dispatched request and its latency.
    ///
    /// The running mean uses the incremental update
    /// `mean += (x - mean) / n`, so it is exact for the observed sequence
    /// without storing it.
    pub fn record_request(&mut self, latency_ms: f64) {
        self.total_requests += 1;
        self.last_latency_ms = latency_ms;
        self.avg_latency_ms += (latency_ms - self.avg_latency_ms) / self.total_requests as f64;
    }

    /// Records one protocol-corrupt frame.
    pub fn record_bad_frame(&mut self) {
        self.bad_frames += 1;
    }

    /// Records one successfully installed route record.
    pub fn record_route_installed(&mut self) {
        self.routes_installed += 1;
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn bad_frames(&self) -> u64 {
        self.bad_frames
    }

    pub fn routes_installed(&self) -> u64 {
        self.routes_installed
    }

    /// Snapshots the counters for a STATS_REPLY.
    pub fn snapshot(&self, uptime_ms: u64) -> StatsSnapshot {
        StatsSnapshot {
            total_requests: self.total_requests,
            bad_frames: self.bad_frames,
            routes_installed: self.routes_installed,
            uptime_ms,
            last_latency_us: (self.last_latency_ms * 1000.0) as u32,
            avg_latency_us: (self.avg_latency_ms * 1000.0) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incremental_mean_matches_direct_mean() {
        let samples = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let mut stats = RequestStats::new();
        for s in samples {
            stats.record_request(s);
        }

        let direct: f64 = samples.iter().sum::<f64>() / samples.len() as f64;
        assert!((stats.avg_latency_ms - direct).abs() < 1e-9);
        assert_eq!(stats.total_requests(), samples.len() as u64);
        assert_eq!(stats.last_latency_ms, 9.0);
    }

    #[test]
    fn test_snapshot_converts_to_microseconds() {
        let mut stats = RequestStats::new();
        stats.record_request(1.5);
        stats.record_request(0.5);

        let snap = stats.snapshot(12_000);
        assert_eq!(snap.uptime_ms, 12_000);
        assert_eq!(snap.last_latency_us, 500);
        assert_eq!(snap.avg_latency_us, 1000);
    }

    #[test]
    fn test_counters_are_independent() {
        let mut stats = RequestStats::new();
        stats.record_bad_frame();
        stats.record_bad_frame();
        stats.record_route_installed();

        assert_eq!(stats.total_requests(), 0);
        assert_eq!(stats.bad_frames(), 2);
        assert_eq!(stats.routes_installed(), 1);
    }
}
