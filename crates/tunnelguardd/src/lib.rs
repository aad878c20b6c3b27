//! tunnelguard daemon: configuration and Prometheus exporters.
//!
//! The control loop itself lives in `tunnelguard-core`; this crate wires it
//! to the WireGuard CLI driver and exposes the shared metrics store through
//! an HTTP endpoint and a node_exporter textfile.

pub mod config;
pub mod error;
pub mod exporter;
pub mod metrics_server;
pub mod metrics_writer;

pub use config::GuardConfig;
pub use error::{ConfigError, ExportError};
pub use metrics_writer::MetricsWriter;
