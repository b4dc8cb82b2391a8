//! Prometheus metrics implementation

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;

/// Histogram bucket bounds in seconds
const BUCKETS: [f64; 12] = [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// In-process metrics registry.
///
/// Series keys carry their labels inline (`name{label="v"}`); the text
/// exporter groups them under one `# TYPE` line per metric name.
pub struct MetricsRegistry {
    counters: RwLock<BTreeMap<String, AtomicU64>>,
    gauges: RwLock<BTreeMap<String, AtomicU64>>,
    histograms: RwLock<BTreeMap<String, Histogram>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(BTreeMap::new()),
            gauges: RwLock::new(BTreeMap::new()),
            histograms: RwLock::new(BTreeMap::new()),
        }
    }

    /// Increment a counter
    pub fn counter_inc(&self, name: &str, value: u64) {
        let counters = self.counters.read();
        if let Some(counter) = counters.get(name) {
            counter.fetch_add(value, Ordering::Relaxed);
        } else {
            drop(counters);
            let mut counters = self.counters.write();
            counters
                .entry(name.to_string())
                .or_insert_with(|| AtomicU64::new(0))
                .fetch_add(value, Ordering::Relaxed);
        }
    }

    /// Current value of a counter, zero if never incremented
    pub fn counter_get(&self, name: &str) -> u64 {
        self.counters
            .read()
            .get(name)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    /// Set a gauge value
    pub fn gauge_set(&self, name: &str, value: u64) {
        let mut gauges = self.gauges.write();
        gauges
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .store(value, Ordering::Relaxed);
    }

    /// Record a histogram observation
    pub fn histogram_observe(&self, name: &str, value: f64) {
        let histograms = self.histograms.read();
        if let Some(hist) = histograms.get(name) {
            hist.observe(value);
        } else {
            drop(histograms);
            let mut histograms = self.histograms.write();
            histograms
                .entry(name.to_string())
                .or_insert_with(Histogram::new)
                .observe(value);
        }
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();
        let mut typed = HashSet::new();

        let mut type_line = |output: &mut String, key: &str, kind: &str| {
            let base = base_name(key);
            if typed.insert(base.to_string()) {
                output.push_str(&format!("# TYPE {} {}\n", base, kind));
            }
        };

        for (name, counter) in self.counters.read().iter() {
            type_line(&mut output, name, "counter");
            output.push_str(&format!("{} {}\n", name, counter.load(Ordering::Relaxed)));
        }

        for (name, gauge) in self.gauges.read().iter() {
            type_line(&mut output, name, "gauge");
            output.push_str(&format!("{} {}\n", name, gauge.load(Ordering::Relaxed)));
        }

        for (name, hist) in self.histograms.read().iter() {
            type_line(&mut output, name, "histogram");
            let stats = hist.stats();
            let (base, labels) = split_labels(name);

            for (bound, count) in BUCKETS.iter().zip(hist.bucket_counts()) {
                output.push_str(&format!(
                    "{}_bucket{{{}le=\"{}\"}} {}\n",
                    base, labels, bound, count
                ));
            }
            output.push_str(&format!(
                "{}_bucket{{{}le=\"+Inf\"}} {}\n",
                base, labels, stats.count
            ));

            let suffix = if labels.is_empty() {
                String::new()
            } else {
                format!("{{{}}}", labels.trim_end_matches(','))
            };
            output.push_str(&format!("{}_sum{} {}\n", base, suffix, stats.sum));
            output.push_str(&format!("{}_count{} {}\n", base, suffix, stats.count));
        }

        output
    }

    /// Reset all metrics
    pub fn reset(&self) {
        for counter in self.counters.write().values() {
            counter.store(0, Ordering::Relaxed);
        }
        for gauge in self.gauges.write().values() {
            gauge.store(0, Ordering::Relaxed);
        }
        self.histograms.write().clear();
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn base_name(key: &str) -> &str {
    key.split('{').next().unwrap_or(key)
}

/// Split `name{a="b"}` into `("name", "a=\"b\",")`
fn split_labels(key: &str) -> (&str, String) {
    match key.split_once('{') {
        Some((base, rest)) => {
            let labels = rest.trim_end_matches('}');
            (base, format!("{},", labels))
        }
        None => (key, String::new()),
    }
}

/// Fixed-bucket histogram with a bounded sample reservoir for percentiles
pub struct Histogram {
    buckets: [AtomicU64; BUCKETS.len()],
    samples: RwLock<Vec<f64>>,
    sum_micros: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    const MAX_SAMPLES: usize = 10_000;

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            samples: RwLock::new(Vec::with_capacity(1024)),
            sum_micros: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    pub fn observe(&self, value: f64) {
        for (bound, bucket) in BUCKETS.iter().zip(&self.buckets) {
            if value <= *bound {
                bucket.fetch_add(1, Ordering::Relaxed);
            }
        }

        let mut samples = self.samples.write();
        if samples.len() < Self::MAX_SAMPLES {
            samples.push(value);
        } else {
            let idx = rand::random::<usize>() % samples.len();
            samples[idx] = value;
        }

        self.sum_micros
            .fetch_add((value.max(0.0) * 1_000_000.0) as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Cumulative count per bucket bound
    pub fn bucket_counts(&self) -> Vec<u64> {
        self.buckets.iter().map(|b| b.load(Ordering::Relaxed)).collect()
    }

    pub fn stats(&self) -> HistogramStats {
        let samples = self.samples.read();
        let count = self.count.load(Ordering::Relaxed);

        if samples.is_empty() {
            return HistogramStats::default();
        }

        let sum = self.sum_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0;
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;

        let mut sorted = samples.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let percentile = |p: f64| -> f64 {
            let idx = ((p / 100.0) * (sorted.len() - 1) as f64) as usize;
            sorted[idx.min(sorted.len() - 1)]
        };

        HistogramStats {
            count,
            sum,
            mean,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            p50: percentile(50.0),
            p90: percentile(90.0),
            p95: percentile(95.0),
            p99: percentile(99.0),
        }
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Histogram statistics
#[derive(Debug, Clone, Default)]
pub struct HistogramStats {
    pub count: u64,
    pub sum: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Pre-defined metric names
pub mod metric_names {
    // Simulated traffic
    pub const REQUESTS_TOTAL: &str = "mock_simulator_requests_total";
    pub const REQUEST_DURATION: &str = "mock_simulator_request_duration_seconds";
    pub const ACTIVE_REQUESTS: &str = "mock_simulator_active_requests";
    pub const CHAOS_INJECTIONS: &str = "mock_simulator_chaos_injections_total";
    pub const ABORTED_REQUESTS: &str = "mock_simulator_aborted_requests_total";

    // Traffic log
    pub const LOG_WRITE_FAILURES: &str = "mock_simulator_log_write_failures_total";

    // Configuration
    pub const MOCK_SERVERS: &str = "mock_simulator_mock_servers";
    pub const MOCK_ROUTES: &str = "mock_simulator_mock_routes";
    pub const MANAGEMENT_OPERATIONS: &str = "mock_simulator_management_operations_total";
}

/// Convenience functions for the simulator's metrics
pub struct SimulatorMetrics {
    registry: MetricsRegistry,
}

impl SimulatorMetrics {
    pub fn new() -> Self {
        let metrics = Self {
            registry: MetricsRegistry::new(),
        };

        metrics.set_active_requests(0);
        metrics.registry.counter_inc(metric_names::LOG_WRITE_FAILURES, 0);

        metrics
    }

    /// Record a finished simulated request by outcome
    /// (`served`, `server_not_found`, `route_not_found`, `chaos`, `aborted`)
    pub fn record_request(&self, outcome: &str, duration: Duration) {
        let key = format!("{}{{outcome=\"{}\"}}", metric_names::REQUESTS_TOTAL, outcome);
        self.registry.counter_inc(&key, 1);
        self.registry
            .histogram_observe(metric_names::REQUEST_DURATION, duration.as_secs_f64());
    }

    pub fn record_chaos_injection(&self) {
        self.registry.counter_inc(metric_names::CHAOS_INJECTIONS, 1);
    }

    pub fn record_aborted(&self) {
        self.registry.counter_inc(metric_names::ABORTED_REQUESTS, 1);
    }

    pub fn record_log_write_failure(&self) {
        self.registry.counter_inc(metric_names::LOG_WRITE_FAILURES, 1);
    }

    pub fn log_write_failures(&self) -> u64 {
        self.registry.counter_get(metric_names::LOG_WRITE_FAILURES)
    }

    /// Record a management API mutation (`create_server`, `delete_route`, ...)
    pub fn record_management(&self, operation: &str) {
        let key = format!(
            "{}{{operation=\"{}\"}}",
            metric_names::MANAGEMENT_OPERATIONS,
            operation
        );
        self.registry.counter_inc(&key, 1);
    }

    /// Set the number of in-flight simulated requests
    pub fn set_active_requests(&self, count: u64) {
        self.registry.gauge_set(metric_names::ACTIVE_REQUESTS, count);
    }

    /// Set the configured server and route totals
    pub fn set_mock_counts(&self, servers: usize, routes: usize) {
        self.registry.gauge_set(metric_names::MOCK_SERVERS, servers as u64);
        self.registry.gauge_set(metric_names::MOCK_ROUTES, routes as u64);
    }

    /// Export metrics in Prometheus format
    pub fn export(&self) -> String {
        self.registry.export_prometheus()
    }

    /// Reset all metrics
    pub fn reset(&self) {
        self.registry.reset();
    }
}

impl Default for SimulatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}
