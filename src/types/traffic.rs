//! Traffic log records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RouteId, ServerId};

/// Status recorded when the caller went away before the response was sent
pub const CLIENT_CLOSED_STATUS: u16 = 499;

/// How a simulated request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficOutcome {
    /// A response was produced and handed to the transport
    Completed,
    /// The caller disconnected during the simulated delay
    Aborted,
}

/// Immutable record of one simulated request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficLogEntry {
    pub id: u64,
    pub server_id: Option<ServerId>,
    pub route_id: Option<RouteId>,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub path: String,
    pub status_code: u16,
    pub duration_ms: u64,
    pub is_chaos_triggered: bool,
    pub outcome: TrafficOutcome,
}

/// A log record before the log assigns it an id
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrafficEntry {
    pub server_id: Option<ServerId>,
    pub route_id: Option<RouteId>,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub path: String,
    pub status_code: u16,
    pub duration_ms: u64,
    pub is_chaos_triggered: bool,
    pub outcome: TrafficOutcome,
}

impl NewTrafficEntry {
    pub fn with_id(self, id: u64) -> TrafficLogEntry {
        TrafficLogEntry {
            id,
            server_id: self.server_id,
            route_id: self.route_id,
            timestamp: self.timestamp,
            method: self.method,
            path: self.path,
            status_code: self.status_code,
            duration_ms: self.duration_ms,
            is_chaos_triggered: self.is_chaos_triggered,
            outcome: self.outcome,
        }
    }
}
