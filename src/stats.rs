//! Rolling request statistics for the chat client.
//!
//! Counters only, never persisted, reset on process restart. Cache hits
//! count as requests with zero latency.

/// Rolling counters for completed `ask` calls.
#[derive(Debug, Clone, Default)]
pub struct RequestStats {
    /// Total completed calls, hits included.
    pub total_requests: u64,
    /// Calls answered from the cache.
    pub cache_hits: u64,
    /// Running average latency in milliseconds.
    pub avg_latency_ms: f64,
    /// Fastest observed call in milliseconds.
    pub min_latency_ms: f64,
    /// Slowest observed call in milliseconds.
    pub max_latency_ms: f64,
}

impl RequestStats {
    /// Record one completed call. Hits are recorded with `latency_ms` 0.
    pub fn record(&mut self, latency_ms: f64, cache_hit: bool) {
        self.total_requests += 1;
        if cache_hit {
            self.cache_hits += 1;
        }
        // Incremental running average avoids keeping a sample history.
        self.avg_latency_ms += (latency_ms - self.avg_latency_ms) / self.total_requests as f64;
        if self.total_requests == 1 {
            self.min_latency_ms = latency_ms;
            self.max_latency_ms = latency_ms;
        } else {
            self.min_latency_ms = self.min_latency_ms.min(latency_ms);
            self.max_latency_ms = self.max_latency_ms.max(latency_ms);
        }
    }

    /// Fraction of calls served from the cache, 0.0 when nothing recorded.
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_requests as f64
        }
    }

    /// One-line summary for CLI output.
    pub fn summary(&self) -> String {
        format!(
            "{} requests, {} cache hits ({:.0}%), latency avg {:.0}ms min {:.0}ms max {:.0}ms",
            self.total_requests,
            self.cache_hits,
            self.hit_rate() * 100.0,
            self.avg_latency_ms,
            self.min_latency_ms,
            self.max_latency_ms,
        )
    }
}
