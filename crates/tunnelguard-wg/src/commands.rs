//! Shell command builders for WireGuard operations

use crate::shell::{shellquote, WG_CMD, WG_QUICK_CMD};

/// Build the per-peer latest handshake listing command
///
/// Output is one `<public key>\t<unix seconds>` line per peer.
pub fn build_show_handshakes_cmd(interface: &str) -> String {
    format!("{} show {} latest-handshakes", WG_CMD, shellquote(interface))
}

/// Build the command listing every WireGuard interface
pub fn build_show_all_cmd() -> String {
    format!("{} show", WG_CMD)
}

/// Build the peer endpoint update command
///
/// `wg` resolves hostnames when the endpoint is set.
pub fn build_set_endpoint_cmd(interface: &str, public_key: &str, endpoint: &str) -> String {
    format!(
        "{} set {} peer {} endpoint {}",
        WG_CMD,
        shellquote(interface),
        shellquote(public_key),
        shellquote(endpoint)
    )
}

/// Build the interface bring-up command
pub fn build_tunnel_up_cmd(interface: &str) -> String {
    format!("{} up {}", WG_QUICK_CMD, shellquote(interface))
}
