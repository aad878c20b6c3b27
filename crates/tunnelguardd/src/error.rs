//! Error types for the tunnelguard daemon.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Startup configuration errors. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Config file is not valid JSON for [`GuardConfig`](crate::config::GuardConfig).
    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Parent directory of a user-supplied metrics file does not exist.
    #[error("Base path for writing metrics does not exist: {}", path.display())]
    MetricsDirMissing { path: PathBuf },

    /// Metrics listen address is not `ip:port`.
    #[error("Invalid metrics address '{addr}': {message}")]
    InvalidMetricsAddr { addr: String, message: String },
}

/// Metrics export errors. Logged by the exporters and retried on the next tick.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to encode metrics: {0}")]
    Encode(#[from] prometheus::Error),

    #[error("Failed to write metrics file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
