//! Append-only traffic log

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use thiserror::Error;

use crate::types::{NewTrafficEntry, ServerId, TrafficLogEntry};

/// Default retention per server
pub const DEFAULT_MAX_ENTRIES_PER_SERVER: usize = 10_000;

/// Failure to persist a traffic record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LogWriteError {
    #[error("traffic log unavailable: {0}")]
    Unavailable(String),

    #[error("traffic log rejected entry: {0}")]
    Rejected(String),
}

/// Sink for simulated request records.
///
/// Implementations must accept concurrent appends. Entries are never
/// edited once written.
pub trait TrafficLog: Send + Sync {
    fn append(&self, entry: NewTrafficEntry) -> Result<TrafficLogEntry, LogWriteError>;

    /// Entries for one server, newest first (timestamp then id, descending)
    fn list_for_server(&self, server_id: ServerId) -> Vec<TrafficLogEntry>;
}

/// Bounded in-memory log, bucketed by server.
///
/// Requests against unknown prefixes have no server and land in their own
/// bucket. Each bucket evicts its oldest entries past the retention limit.
pub struct InMemoryTrafficLog {
    next_id: AtomicU64,
    max_entries_per_server: usize,
    buckets: RwLock<HashMap<Option<ServerId>, VecDeque<TrafficLogEntry>>>,
}

impl InMemoryTrafficLog {
    pub fn new(max_entries_per_server: usize) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            max_entries_per_server: max_entries_per_server.max(1),
            buckets: RwLock::new(HashMap::new()),
        }
    }

    /// Total retained entries across all buckets
    pub fn len(&self) -> usize {
        self.buckets.read().values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries recorded without a resolved server, newest first
    pub fn list_unassigned(&self) -> Vec<TrafficLogEntry> {
        self.newest_first(None)
    }

    fn newest_first(&self, key: Option<ServerId>) -> Vec<TrafficLogEntry> {
        let mut entries: Vec<_> = self
            .buckets
            .read()
            .get(&key)
            .map(|bucket| bucket.iter().cloned().collect())
            .unwrap_or_default();

        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        entries
    }
}

impl Default for InMemoryTrafficLog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES_PER_SERVER)
    }
}

impl TrafficLog for InMemoryTrafficLog {
    fn append(&self, entry: NewTrafficEntry) -> Result<TrafficLogEntry, LogWriteError> {
        let mut buckets = self.buckets.write();
        let entry = entry.with_id(self.next_id.fetch_add(1, Ordering::Relaxed));
        let bucket = buckets.entry(entry.server_id).or_default();
        bucket.push_back(entry.clone());
        while bucket.len() > self.max_entries_per_server {
            bucket.pop_front();
        }

        Ok(entry)
    }

    fn list_for_server(&self, server_id: ServerId) -> Vec<TrafficLogEntry> {
        self.newest_first(Some(server_id))
    }
}
