//! Latency simulation module
//!
//! Defers a response by the route's configured delay using tokio timers,
//! so a delayed request never occupies a worker thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::config::LatencyConfig;

/// Applies per-route delays
#[derive(Debug)]
pub struct LatencySimulator {
    enabled: AtomicBool,
}

impl LatencySimulator {
    pub fn new(config: &LatencyConfig) -> Self {
        Self {
            enabled: AtomicBool::new(config.enabled),
        }
    }

    /// Check if latency simulation is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Delay that will actually be applied for a route's `delayMs`
    pub fn effective_delay(&self, delay_ms: u64) -> Duration {
        if !self.is_enabled() {
            return Duration::ZERO;
        }
        Duration::from_millis(delay_ms)
    }

    /// Suspend until `delay_ms` has elapsed since `resolved_at`.
    ///
    /// Returns immediately for a zero delay. Dropping the returned future
    /// cancels the timer.
    pub async fn delay_from(&self, resolved_at: Instant, delay_ms: u64) {
        let delay = self.effective_delay(delay_ms);
        if delay.is_zero() {
            return;
        }
        tokio::time::sleep_until(resolved_at + delay).await;
    }
}

impl Default for LatencySimulator {
    fn default() -> Self {
        Self::new(&LatencyConfig::default())
    }
}

/// Summary statistics over a set of latency samples in milliseconds
#[derive(Debug, Clone, Default, Serialize)]
pub struct SampleSummary {
    pub samples: u64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    pub std_dev_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

impl SampleSummary {
    /// Compute statistics from a set of samples
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let percentile = |p: f64| -> f64 {
            let idx = (p * (sorted.len() - 1) as f64) as usize;
            sorted[idx]
        };

        Self {
            samples: samples.len() as u64,
            min_ms: sorted[0],
            max_ms: sorted[sorted.len() - 1],
            mean_ms: mean,
            std_dev_ms: variance.sqrt(),
            p50_ms: percentile(0.50),
            p95_ms: percentile(0.95),
            p99_ms: percentile(0.99),
        }
    }
}
