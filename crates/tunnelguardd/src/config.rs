//! Daemon configuration.
//!
//! Read once at startup from an optional JSON file. Every field has a
//! default, so an absent file or a partial one is valid:
//!
//! ```json
//! {
//!   "wg_interface_name": "wg0",
//!   "wg_config_file": "/etc/wireguard/wg0.conf",
//!   "nice_names": { "xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=": "office" },
//!   "metrics_file": "/var/lib/node_exporter/tunnelguard.prom",
//!   "metrics_addr": "127.0.0.1:9586"
//! }
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;

pub const DEFAULT_INTERFACE: &str = "wg0";
pub const DEFAULT_WG_CONFIG_FILE: &str = "/etc/wireguard/wg0.conf";
pub const DEFAULT_METRICS_FILE: &str = "/var/lib/node_exporter/tunnelguard.prom";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// WireGuard interface to watch.
    #[serde(rename = "wg_interface_name")]
    pub interface: String,

    /// WireGuard configuration file holding the peer endpoints.
    #[serde(rename = "wg_config_file")]
    pub config_file: PathBuf,

    /// Public key to display name, used as metric label.
    #[serde(rename = "nice_names")]
    pub display_names: HashMap<String, String>,

    /// Prometheus textfile path; empty disables the file writer.
    pub metrics_file: PathBuf,

    /// Listen address of the HTTP metrics endpoint; absent disables it.
    pub metrics_addr: Option<String>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            interface: DEFAULT_INTERFACE.to_string(),
            config_file: PathBuf::from(DEFAULT_WG_CONFIG_FILE),
            display_names: HashMap::new(),
            metrics_file: PathBuf::from(DEFAULT_METRICS_FILE),
            metrics_addr: None,
        }
    }
}

impl GuardConfig {
    /// Loads the config file, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let data = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_json(&data).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    /// Resolves where the metrics file writer should write, if anywhere.
    ///
    /// A missing parent directory disables the writer when the path is the
    /// default one and is an error when the path was configured explicitly.
    pub fn metrics_file_target(&self) -> Result<Option<PathBuf>, ConfigError> {
        if self.metrics_file.as_os_str().is_empty() {
            return Ok(None);
        }

        let base = match self.metrics_file.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        if base.is_dir() {
            return Ok(Some(self.metrics_file.clone()));
        }

        if self.metrics_file == Path::new(DEFAULT_METRICS_FILE) {
            warn!(path = %base.display(), "Disabling metrics writer, path does not exist");
            Ok(None)
        } else {
            Err(ConfigError::MetricsDirMissing {
                path: base.to_path_buf(),
            })
        }
    }

    /// Parses the HTTP metrics listen address, if configured.
    pub fn metrics_listen_addr(&self) -> Result<Option<SocketAddr>, ConfigError> {
        self.metrics_addr
            .as_deref()
            .map(|addr| {
                addr.parse().map_err(|e: std::net::AddrParseError| {
                    ConfigError::InvalidMetricsAddr {
                        addr: addr.to_string(),
                        message: e.to_string(),
                    }
                })
            })
            .transpose()
    }
}
