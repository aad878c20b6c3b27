//! Handshake watchdog for WireGuard meshes.
//!
//! This crate holds the decision logic of tunnelguard:
//!
//! - [`peer`]: peer records and their last-seen handshake instant
//! - [`endpoint`]: static (literal IP) vs dynamic (hostname) endpoint classifier
//! - [`driver`]: the [`TunnelDriver`] capability set the loop calls into
//! - [`metrics`]: the [`MetricsSink`] contract and the shared [`GuardMetrics`] store
//! - [`guard`]: the adaptive polling/reset control loop
//!
//! # Architecture
//!
//! ```text
//! TunnelGuard ──get_peers──▶ TunnelDriver ──▶ [Peer]
//!      │
//!      ├─ stale peer ──get_endpoint──▶ classify ──▶ skip | reset_peer
//!      ├─ driver error ──is_tunnel_up──▶ start_tunnel
//!      └─ every step ──▶ MetricsSink
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use tunnelguard_core::{GuardMetrics, TunnelGuard};
//!
//! let metrics = Arc::new(GuardMetrics::new());
//! let guard = TunnelGuard::new(driver, metrics.clone());
//! guard.run(CancellationToken::new()).await;
//! ```

pub mod driver;
pub mod endpoint;
pub mod error;
pub mod guard;
pub mod metrics;
pub mod peer;

pub use driver::TunnelDriver;
pub use endpoint::{classify, EndpointKind};
pub use error::{DriverError, DriverResult, EndpointError};
pub use guard::{
    next_delay, TunnelGuard, DEFAULT_WAIT, HANDSHAKE_TIMEOUT, ERROR_GET_ENDPOINT, ERROR_GET_PEERS,
    ERROR_RESET_PEER,
};
pub use metrics::{GuardMetrics, MetricsSink, MetricsSnapshot, PeerMetricValue};
pub use peer::Peer;
