//! WireGuard CLI driver for tunnelguard.
//!
//! - [`shell`]: command execution with proper quoting
//! - [`commands`]: `wg` / `wg-quick` command builders
//! - [`handshakes`]: latest-handshake output source and parser
//! - [`wg_config`]: WireGuard configuration file parser
//! - [`WgCli`]: the [`TunnelDriver`](tunnelguard_core::TunnelDriver) implementation
//!
//! | Operation | Command |
//! |-----------|---------|
//! | `get_peers` | `wg show <iface> latest-handshakes` |
//! | `get_endpoint` | parse the interface config file |
//! | `reset_peer` | `wg set <iface> peer <key> endpoint <endpoint>` |
//! | `start_tunnel` | `wg-quick up <iface>` |
//! | `is_tunnel_up` | `wg show` |

pub mod commands;
pub mod handshakes;
pub mod shell;
pub mod wg_cli;
pub mod wg_config;

pub use handshakes::{parse_latest_handshakes, HandshakeSource, WgShowHandshakes};
pub use wg_cli::WgCli;
pub use wg_config::WgConfig;
