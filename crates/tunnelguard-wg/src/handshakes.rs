//! `wg show <iface> latest-handshakes` source and parser.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use tunnelguard_core::{DriverError, DriverResult, Peer};

use crate::commands::build_show_handshakes_cmd;
use crate::shell;

/// Provider of raw latest-handshake output.
#[async_trait]
pub trait HandshakeSource: Send + Sync {
    async fn latest_handshakes(&self) -> DriverResult<String>;
}

/// Reads handshakes by running `wg show <iface> latest-handshakes`.
#[derive(Debug, Clone)]
pub struct WgShowHandshakes {
    interface: String,
}

impl WgShowHandshakes {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }
}

#[async_trait]
impl HandshakeSource for WgShowHandshakes {
    async fn latest_handshakes(&self) -> DriverResult<String> {
        shell::exec_or_throw(&build_show_handshakes_cmd(&self.interface)).await
    }
}

/// Parses latest-handshake output into peers.
///
/// Lines with fewer than two columns are skipped. A timestamp of `0` means
/// the peer never completed a handshake. Parsed peers carry no endpoint.
///
/// # Errors
///
/// [`DriverError::Parse`] when a timestamp column is not a signed 64-bit
/// integer or lies outside the range of [`SystemTime`].
pub fn parse_latest_handshakes(output: &str) -> DriverResult<Vec<Peer>> {
    let mut peers = Vec::new();

    for line in output.lines() {
        let columns: Vec<&str> = line.split_whitespace().collect();
        if columns.len() < 2 {
            continue;
        }

        let timestamp: i64 = columns[1].parse().map_err(|e| {
            DriverError::parse("handshake time", format!("{:?}: {}", columns[1], e))
        })?;

        let mut peer = Peer::new(columns[0]);
        if timestamp != 0 {
            let seen = from_unix(timestamp).ok_or_else(|| {
                DriverError::parse("handshake time", format!("{:?}: out of range", columns[1]))
            })?;
            peer = peer.with_last_handshake(seen);
        }
        peers.push(peer);
    }

    Ok(peers)
}

/// Converts a unix timestamp in seconds to a [`SystemTime`].
///
/// Returns `None` when the instant is not representable on this platform.
pub fn from_unix(secs: i64) -> Option<SystemTime> {
    let offset = Duration::from_secs(secs.unsigned_abs());
    if secs >= 0 {
        UNIX_EPOCH.checked_add(offset)
    } else {
        UNIX_EPOCH.checked_sub(offset)
    }
}
