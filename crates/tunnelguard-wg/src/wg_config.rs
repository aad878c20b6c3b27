//! WireGuard configuration file parser.
//!
//! Only what the watchdog needs is extracted: the `PublicKey` and `Endpoint`
//! of every `[Peer]` section. The format is the INI-like one used by
//! `wg-quick`:
//!
//! ```text
//! [Interface]
//! PrivateKey = ...
//!
//! [Peer]
//! PublicKey = bbb=
//! Endpoint = my-endpoint:51820
//! ```

use std::path::Path;

use tunnelguard_core::{DriverError, DriverResult, Peer};

const PEER_SECTION: &str = "Peer";
const KEY_PUBLIC_KEY: &str = "PublicKey";
const KEY_ENDPOINT: &str = "Endpoint";

/// Peers declared in a WireGuard configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WgConfig {
    pub peers: Vec<Peer>,
}

impl WgConfig {
    /// Parses configuration text. Malformed lines are skipped.
    pub fn parse(content: &str) -> Self {
        let mut config = WgConfig::default();
        let mut section: Option<&str> = None;
        let mut current = Peer::new("");

        for raw in content.lines() {
            let line = raw.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                if section == Some(PEER_SECTION) {
                    config.peers.push(std::mem::replace(&mut current, Peer::new("")));
                }
                section = Some(line.trim_matches(|c| c == '[' || c == ']'));
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim().trim_matches('"');

            if section == Some(PEER_SECTION) {
                match key {
                    KEY_PUBLIC_KEY => current.public_key = value.to_string(),
                    KEY_ENDPOINT => current.endpoint = Some(value.to_string()),
                    _ => {}
                }
            }
        }

        if section == Some(PEER_SECTION) {
            config.peers.push(current);
        }

        config
    }

    /// Reads and parses a configuration file.
    pub async fn load(path: &Path) -> DriverResult<Self> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| DriverError::ConfigRead {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        Ok(Self::parse(&content))
    }

    /// Configured endpoint of a peer.
    ///
    /// # Errors
    ///
    /// [`DriverError::PeerNotFound`] when no `[Peer]` has this public key.
    pub fn endpoint_of(&self, public_key: &str) -> DriverResult<Option<String>> {
        self.peers
            .iter()
            .find(|p| p.public_key == public_key)
            .map(|p| p.endpoint.clone())
            .ok_or_else(|| DriverError::peer_not_found(public_key))
    }
}
