//! Chaos injection

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use rand::Rng;

use super::ResponsePlan;
use crate::config::ChaosConfig;
use crate::types::ChaosSettings;

/// Status returned for every injected failure
pub const CHAOS_STATUS: u16 = 500;

/// Uniform samples in `[0, 1)`
pub trait RandomSource: Send + Sync {
    fn sample(&self) -> f64;
}

/// Thread-local OS-seeded generator
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn sample(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Replays a fixed list of samples, wrapping around at the end.
///
/// An empty script always yields `0.0`.
#[derive(Debug)]
pub struct ScriptedRandom {
    samples: Vec<f64>,
    cursor: AtomicUsize,
}

impl ScriptedRandom {
    pub fn new(samples: impl IntoIterator<Item = f64>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Number of samples drawn so far
    pub fn draws(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }
}

impl RandomSource for ScriptedRandom {
    fn sample(&self) -> f64 {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed);
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples[idx % self.samples.len()]
    }
}

/// Outcome of the per-request chaos roll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChaosDecision {
    Pass,
    Inject,
}

/// Decides whether a request gets a simulated failure
pub struct ChaosPolicy {
    enabled: AtomicBool,
    error_body: Bytes,
    random: Arc<dyn RandomSource>,
}

impl ChaosPolicy {
    pub fn new(config: &ChaosConfig) -> Self {
        Self {
            enabled: AtomicBool::new(config.enabled),
            error_body: Bytes::from(config.error_body()),
            random: Arc::new(ThreadRandom),
        }
    }

    pub fn with_random_source(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Whether the process-wide switch allows injection
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Roll for one request.
    ///
    /// Draws exactly one sample when the route has chaos enabled and the
    /// global switch is on, and none otherwise.
    pub fn decide(&self, settings: ChaosSettings) -> ChaosDecision {
        if !settings.enabled || !self.is_enabled() {
            return ChaosDecision::Pass;
        }

        if self.random.sample() < settings.failure_rate {
            ChaosDecision::Inject
        } else {
            ChaosDecision::Pass
        }
    }

    /// Response sent in place of the route's own
    pub fn failure_plan(&self) -> ResponsePlan {
        ResponsePlan {
            status: CHAOS_STATUS,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: self.error_body.clone(),
        }
    }
}

impl Default for ChaosPolicy {
    fn default() -> Self {
        Self::new(&ChaosConfig::default())
    }
}
