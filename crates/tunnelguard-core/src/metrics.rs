//! Metrics sink contract and the shared in-process metrics store.
//!
//! The control loop writes through [`MetricsSink`]; exporters read
//! [`GuardMetrics::snapshot`] from other tasks. The store lives for the whole
//! process and is shared as `Arc<GuardMetrics>`.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;

/// Write side of the metrics the control loop emits.
pub trait MetricsSink: Send + Sync {
    /// Record that a cycle started at `at`.
    fn set_heartbeat(&self, at: SystemTime);

    /// Count one failure of the given kind (`get_peers`, `get_endpoint`, `reset_peer`).
    fn increment_error(&self, kind: &str);

    /// Count one reset of a peer.
    fn increment_peer_reset(&self, public_key: &str, display_name: Option<&str>);

    /// Record the latest handshake instant of a peer.
    fn set_latest_handshake(&self, public_key: &str, display_name: Option<&str>, at: SystemTime);
}

/// Per-peer counter or gauge value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerMetricValue {
    pub value: i64,
    /// Operator-supplied alias for the public key.
    pub display_name: Option<String>,
}

impl PeerMetricValue {
    /// Label to export: the display name, or the public key when there is none.
    pub fn label<'a>(&'a self, public_key: &'a str) -> &'a str {
        self.display_name.as_deref().unwrap_or(public_key)
    }
}

/// Point-in-time copy of all metrics, keyed by error kind or public key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub heartbeat: Option<SystemTime>,
    pub errors: BTreeMap<String, u64>,
    pub peer_resets: BTreeMap<String, PeerMetricValue>,
    pub latest_handshakes: BTreeMap<String, PeerMetricValue>,
}

impl MetricsSnapshot {
    /// Heartbeat as unix seconds, if a cycle has run.
    pub fn heartbeat_unix(&self) -> Option<i64> {
        self.heartbeat.map(unix_seconds)
    }
}

/// Thread-safe metrics store implementing [`MetricsSink`].
#[derive(Debug, Default)]
pub struct GuardMetrics {
    state: RwLock<MetricsSnapshot>,
}

impl GuardMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the current values for export.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.state.read().clone()
    }

    /// Error count for one kind, zero when never incremented.
    pub fn error_count(&self, kind: &str) -> u64 {
        self.state.read().errors.get(kind).copied().unwrap_or(0)
    }

    /// Reset count for one peer, zero when never reset.
    pub fn reset_count(&self, public_key: &str) -> i64 {
        self.state
            .read()
            .peer_resets
            .get(public_key)
            .map(|v| v.value)
            .unwrap_or(0)
    }
}

impl MetricsSink for GuardMetrics {
    fn set_heartbeat(&self, at: SystemTime) {
        self.state.write().heartbeat = Some(at);
    }

    fn increment_error(&self, kind: &str) {
        *self.state.write().errors.entry(kind.to_string()).or_insert(0) += 1;
    }

    fn increment_peer_reset(&self, public_key: &str, display_name: Option<&str>) {
        let mut state = self.state.write();
        let entry = state.peer_resets.entry(public_key.to_string()).or_default();
        entry.value += 1;
        entry.display_name = display_name.map(str::to_string);
    }

    fn set_latest_handshake(&self, public_key: &str, display_name: Option<&str>, at: SystemTime) {
        let mut state = self.state.write();
        let entry = state
            .latest_handshakes
            .entry(public_key.to_string())
            .or_default();
        entry.value = unix_seconds(at);
        entry.display_name = display_name.map(str::to_string);
    }
}

/// Seconds since the unix epoch, negative for instants before it.
pub fn unix_seconds(at: SystemTime) -> i64 {
    match at.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        Err(e) => i64::try_from(e.duration().as_secs()).map_or(i64::MIN, |s| -s),
    }
}
