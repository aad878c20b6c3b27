//! Tunnel driver contract.
//!
//! The control loop only ever talks to the tunnel through this trait. The
//! WireGuard CLI implementation lives in `tunnelguard-wg`; tests use doubles.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DriverResult;
use crate::peer::Peer;

/// Capability set the control loop needs from the tunnel tooling.
///
/// Every call is expected to return in bounded time. Callers never retry a
/// failed call inline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TunnelDriver: Send + Sync {
    /// Snapshot of all peers with their last handshake instants.
    ///
    /// Order is driver-defined. Public keys must be unique.
    async fn get_peers(&self) -> DriverResult<Vec<Peer>>;

    /// Configured endpoint of a peer, `None` when the peer has none.
    ///
    /// Fails with [`DriverError::PeerNotFound`](crate::DriverError::PeerNotFound)
    /// when the key is absent from the static configuration.
    async fn get_endpoint(&self, public_key: &str) -> DriverResult<Option<String>>;

    /// Re-apply `endpoint` to the peer. Re-issuing the same endpoint is harmless.
    async fn reset_peer(&self, public_key: &str, endpoint: &str) -> DriverResult<()>;

    /// Bring the whole interface up.
    async fn start_tunnel(&self) -> DriverResult<()>;

    /// Whether the interface is currently up.
    async fn is_tunnel_up(&self) -> DriverResult<bool>;
}

#[async_trait]
impl<T: TunnelDriver + ?Sized> TunnelDriver for Arc<T> {
    async fn get_peers(&self) -> DriverResult<Vec<Peer>> {
        (**self).get_peers().await
    }

    async fn get_endpoint(&self, public_key: &str) -> DriverResult<Option<String>> {
        (**self).get_endpoint(public_key).await
    }

    async fn reset_peer(&self, public_key: &str, endpoint: &str) -> DriverResult<()> {
        (**self).reset_peer(public_key, endpoint).await
    }

    async fn start_tunnel(&self) -> DriverResult<()> {
        (**self).start_tunnel().await
    }

    async fn is_tunnel_up(&self) -> DriverResult<bool> {
        (**self).is_tunnel_up().await
    }
}
