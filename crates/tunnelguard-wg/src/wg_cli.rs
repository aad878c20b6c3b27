//! [`TunnelDriver`] implementation backed by the `wg` and `wg-quick` tools.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{info, warn};

use tunnelguard_core::{DriverError, DriverResult, Peer, TunnelDriver};

use crate::commands::*;
use crate::handshakes::{parse_latest_handshakes, HandshakeSource, WgShowHandshakes};
use crate::shell::{self, ExecResult};
use crate::wg_config::WgConfig;

/// WireGuard CLI driver for one interface.
///
/// Live handshakes come from `wg show`; endpoints come from the interface's
/// configuration file, which is re-read on every lookup.
pub struct WgCli {
    interface: String,
    config_file: PathBuf,
    handshakes: Box<dyn HandshakeSource>,

    #[cfg(test)]
    mock: Option<MockShell>,
}

#[cfg(test)]
struct MockShell {
    output: ExecResult,
    captured_commands: parking_lot::Mutex<Vec<String>>,
}

impl WgCli {
    /// Creates a driver for `interface` configured by `config_file`.
    ///
    /// # Errors
    ///
    /// Fails when either argument is empty or the configuration file does
    /// not exist.
    pub fn new(interface: impl Into<String>, config_file: impl Into<PathBuf>) -> DriverResult<Self> {
        let interface = interface.into();
        let config_file = config_file.into();

        if interface.is_empty() {
            return Err(DriverError::invalid_argument(
                "interface",
                "empty interface name provided",
            ));
        }
        if config_file.as_os_str().is_empty() {
            return Err(DriverError::invalid_argument(
                "config_file",
                "empty config file provided",
            ));
        }
        // Other errors surface on the first endpoint lookup
        if let Err(e) = std::fs::metadata(&config_file) {
            if e.kind() == ErrorKind::NotFound {
                return Err(DriverError::ConfigRead {
                    path: config_file,
                    source: e,
                });
            }
            warn!(config = %config_file.display(), error = %e, "Cannot stat config file");
        }

        info!(interface = %interface, config = %config_file.display(), "WgCli initialized");

        Ok(Self {
            handshakes: Box::new(WgShowHandshakes::new(interface.clone())),
            interface,
            config_file,
            #[cfg(test)]
            mock: None,
        })
    }

    /// Replace the handshake source (builder pattern)
    pub fn with_handshake_source(mut self, source: impl HandshakeSource + 'static) -> Self {
        self.handshakes = Box::new(source);
        self
    }

    #[cfg(test)]
    fn with_mock_output(mut self, output: ExecResult) -> Self {
        self.mock = Some(MockShell {
            output,
            captured_commands: parking_lot::Mutex::new(Vec::new()),
        });
        self
    }

    #[cfg(test)]
    fn get_captured_commands(&self) -> Vec<String> {
        self.mock
            .as_ref()
            .map(|m| m.captured_commands.lock().clone())
            .unwrap_or_default()
    }

    /// Execute shell command (or capture in mock mode)
    async fn exec(&self, cmd: &str) -> DriverResult<ExecResult> {
        #[cfg(test)]
        if let Some(mock) = &self.mock {
            mock.captured_commands.lock().push(cmd.to_string());
            return Ok(mock.output.clone());
        }

        shell::exec(cmd).await
    }
}

#[async_trait]
impl TunnelDriver for WgCli {
    async fn get_peers(&self) -> DriverResult<Vec<Peer>> {
        let output = self.handshakes.latest_handshakes().await?;
        parse_latest_handshakes(&output)
    }

    async fn get_endpoint(&self, public_key: &str) -> DriverResult<Option<String>> {
        WgConfig::load(&self.config_file)
            .await?
            .endpoint_of(public_key)
    }

    async fn reset_peer(&self, public_key: &str, endpoint: &str) -> DriverResult<()> {
        let cmd = build_set_endpoint_cmd(&self.interface, public_key, endpoint);
        self.exec(&cmd).await?.into_result(&cmd)?;
        Ok(())
    }

    async fn start_tunnel(&self) -> DriverResult<()> {
        let cmd = build_tunnel_up_cmd(&self.interface);
        self.exec(&cmd).await?.into_result(&cmd)?;
        Ok(())
    }

    async fn is_tunnel_up(&self) -> DriverResult<bool> {
        let cmd = build_show_all_cmd();
        let result = self.exec(&cmd).await?;
        if !result.success() {
            return Err(DriverError::CommandFailed {
                command: cmd,
                exit_code: result.exit_code,
                output: result.combined_output(),
            });
        }

        let needle = format!("interface: {}", self.interface.to_lowercase());
        Ok(result.combined_output().contains(&needle))
    }
}
