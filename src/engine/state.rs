//! Engine state and statistics tracking

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::DispatchOutcome;

/// Thread-safe engine state tracking
pub struct EngineState {
    total_requests: AtomicU64,
    active_requests: AtomicU64,
    served: AtomicU64,
    server_not_found: AtomicU64,
    route_not_found: AtomicU64,
    chaos_injected: AtomicU64,
    aborted: AtomicU64,
    log_write_failures: AtomicU64,
    latencies: RwLock<LatencyTracker>,
}

impl EngineState {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            active_requests: AtomicU64::new(0),
            served: AtomicU64::new(0),
            server_not_found: AtomicU64::new(0),
            route_not_found: AtomicU64::new(0),
            chaos_injected: AtomicU64::new(0),
            aborted: AtomicU64::new(0),
            log_write_failures: AtomicU64::new(0),
            latencies: RwLock::new(LatencyTracker::new()),
        }
    }

    /// Count a request entering dispatch; returns the in-flight count
    pub fn request_started(&self) -> u64 {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.active_requests.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Count a request leaving dispatch; returns the in-flight count
    pub fn request_finished(&self, outcome: DispatchOutcome, elapsed: Duration) -> u64 {
        let counter = match outcome {
            DispatchOutcome::Served => &self.served,
            DispatchOutcome::ServerNotFound => &self.server_not_found,
            DispatchOutcome::RouteNotFound => &self.route_not_found,
            DispatchOutcome::ChaosInjected => &self.chaos_injected,
            DispatchOutcome::Aborted => &self.aborted,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.latencies.write().record(elapsed);

        let previous = self
            .active_requests
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| Some(n.saturating_sub(1)))
            .unwrap_or(0);
        previous.saturating_sub(1)
    }

    pub fn increment_log_failures(&self) {
        self.log_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current statistics
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            active_requests: self.active_requests.load(Ordering::Relaxed),
            served: self.served.load(Ordering::Relaxed),
            server_not_found: self.server_not_found.load(Ordering::Relaxed),
            route_not_found: self.route_not_found.load(Ordering::Relaxed),
            chaos_injected: self.chaos_injected.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
            log_write_failures: self.log_write_failures.load(Ordering::Relaxed),
            latency: self.latencies.read().stats(),
        }
    }

    /// Reset all statistics except the in-flight gauge
    pub fn reset(&self) {
        self.total_requests.store(0, Ordering::Relaxed);
        self.served.store(0, Ordering::Relaxed);
        self.server_not_found.store(0, Ordering::Relaxed);
        self.route_not_found.store(0, Ordering::Relaxed);
        self.chaos_injected.store(0, Ordering::Relaxed);
        self.aborted.store(0, Ordering::Relaxed);
        self.log_write_failures.store(0, Ordering::Relaxed);
        *self.latencies.write() = LatencyTracker::new();
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}

/// Engine statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineStats {
    pub total_requests: u64,
    pub active_requests: u64,
    pub served: u64,
    pub server_not_found: u64,
    pub route_not_found: u64,
    pub chaos_injected: u64,
    pub aborted: u64,
    pub log_write_failures: u64,
    pub latency: LatencyStats,
}

impl EngineStats {
    /// Share of finished requests that received an injected failure
    pub fn chaos_rate(&self) -> f64 {
        let finished = self.finished();
        if finished == 0 {
            0.0
        } else {
            self.chaos_injected as f64 / finished as f64
        }
    }

    /// Share of finished requests answered with a 404
    pub fn not_found_rate(&self) -> f64 {
        let finished = self.finished();
        if finished == 0 {
            0.0
        } else {
            (self.server_not_found + self.route_not_found) as f64 / finished as f64
        }
    }

    fn finished(&self) -> u64 {
        self.served + self.server_not_found + self.route_not_found + self.chaos_injected + self.aborted
    }
}

/// Tracks latency measurements with reservoir sampling
struct LatencyTracker {
    samples: Vec<Duration>,
    count: u64,
    max_samples: usize,
    sum: Duration,
    min: Option<Duration>,
    max: Option<Duration>,
}

impl LatencyTracker {
    fn new() -> Self {
        Self::with_capacity(10_000)
    }

    fn with_capacity(max_samples: usize) -> Self {
        Self {
            samples: Vec::with_capacity(max_samples.min(1024)),
            count: 0,
            max_samples,
            sum: Duration::ZERO,
            min: None,
            max: None,
        }
    }

    fn record(&mut self, latency: Duration) {
        self.count += 1;
        self.sum += latency;

        self.min = Some(self.min.map_or(latency, |m| m.min(latency)));
        self.max = Some(self.max.map_or(latency, |m| m.max(latency)));

        if self.samples.len() < self.max_samples {
            self.samples.push(latency);
        } else {
            // Replace with probability max_samples/count
            let idx = rand::random::<usize>() % self.count as usize;
            if idx < self.max_samples {
                self.samples[idx] = latency;
            }
        }
    }

    fn stats(&self) -> LatencyStats {
        if self.count == 0 {
            return LatencyStats::default();
        }

        let mean = self.sum.as_secs_f64() * 1000.0 / self.count as f64;

        let mut sorted: Vec<f64> = self
            .samples
            .iter()
            .map(|d| d.as_secs_f64() * 1000.0)
            .collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let percentile = |p: f64| -> f64 {
            if sorted.is_empty() {
                return 0.0;
            }
            let idx = ((p / 100.0) * (sorted.len() - 1) as f64) as usize;
            sorted[idx.min(sorted.len() - 1)]
        };

        LatencyStats {
            count: self.count,
            mean_ms: mean,
            min_ms: self.min.map_or(0.0, |d| d.as_secs_f64() * 1000.0),
            max_ms: self.max.map_or(0.0, |d| d.as_secs_f64() * 1000.0),
            p50_ms: percentile(50.0),
            p90_ms: percentile(90.0),
            p95_ms: percentile(95.0),
            p99_ms: percentile(99.0),
        }
    }
}

/// Latency statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}
