//! Prometheus text rendering of a [`MetricsSnapshot`].
//!
//! A fresh registry is built per render, so only tunnelguard's own families
//! end up in the output and a textfile collector can merge it with others.

use prometheus::{Encoder, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};

use tunnelguard_core::MetricsSnapshot;

pub const NAMESPACE: &str = "tunnelguard";
const PEERS_SUBSYSTEM: &str = "peers";

/// Content type of the rendered text format.
pub fn content_type() -> String {
    TextEncoder::new().format_type().to_string()
}

/// Renders a snapshot in the Prometheus text exposition format.
pub fn render(snapshot: &MetricsSnapshot) -> Result<String, prometheus::Error> {
    let registry = Registry::new();

    let heartbeat = IntGauge::with_opts(
        Opts::new(
            "heartbeat_timestamp_seconds",
            "Unix time of the latest watchdog cycle",
        )
        .namespace(NAMESPACE),
    )?;
    registry.register(Box::new(heartbeat.clone()))?;
    if let Some(at) = snapshot.heartbeat_unix() {
        heartbeat.set(at);
    }

    let errors = IntCounterVec::new(
        Opts::new("errors_total", "Failed driver operations by kind").namespace(NAMESPACE),
        &["error"],
    )?;
    registry.register(Box::new(errors.clone()))?;
    for (kind, count) in &snapshot.errors {
        errors.with_label_values(&[kind.as_str()]).inc_by(*count);
    }

    let resets = IntCounterVec::new(
        Opts::new("resets_total", "Endpoint resets issued per peer")
            .namespace(NAMESPACE)
            .subsystem(PEERS_SUBSYSTEM),
        &["pub_key", "name"],
    )?;
    registry.register(Box::new(resets.clone()))?;
    for (key, value) in &snapshot.peer_resets {
        resets
            .with_label_values(&[key.as_str(), value.label(key)])
            .inc_by(value.value.max(0) as u64);
    }

    let handshakes = IntGaugeVec::new(
        Opts::new(
            "latest_handshake_timestamp_seconds",
            "Unix time of the latest handshake per peer",
        )
        .namespace(NAMESPACE)
        .subsystem(PEERS_SUBSYSTEM),
        &["pub_key", "name"],
    )?;
    registry.register(Box::new(handshakes.clone()))?;
    for (key, value) in &snapshot.latest_handshakes {
        handshakes
            .with_label_values(&[key.as_str(), value.label(key)])
            .set(value.value);
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
