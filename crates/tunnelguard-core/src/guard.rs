//! Handshake watchdog control loop.
//!
//! Each cycle polls the driver for peers, resets every peer whose last
//! handshake is older than [`HANDSHAKE_TIMEOUT`], and schedules the next
//! cycle just after the oldest remaining handshake would become stale. Driver
//! failures are counted, trigger a tunnel repair attempt, and are otherwise
//! left to the next cycle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::driver::TunnelDriver;
use crate::endpoint::{classify, EndpointKind};
use crate::metrics::MetricsSink;
use crate::peer::Peer;

/// WireGuard re-handshakes at least every 180s on an active tunnel.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(180);

/// Delay used after failures or when no handshake is known.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(30);

/// Error kind counted when listing peers fails.
pub const ERROR_GET_PEERS: &str = "get_peers";

/// Error kind counted when an endpoint lookup fails.
pub const ERROR_GET_ENDPOINT: &str = "get_endpoint";

/// Error kind counted when re-applying an endpoint fails.
pub const ERROR_RESET_PEER: &str = "reset_peer";

/// Computes the delay until the next cycle from the oldest known handshake age.
///
/// Wakes one second after the oldest handshake crosses the timeout, or after
/// [`DEFAULT_WAIT`] when no handshake is known or one is already stale.
pub fn next_delay(max_age: Option<Duration>) -> Duration {
    match max_age {
        Some(age) if age < HANDSHAKE_TIMEOUT => {
            HANDSHAKE_TIMEOUT - age + Duration::from_secs(1)
        }
        _ => DEFAULT_WAIT,
    }
}

/// The watchdog. Owns the driver and writes into a shared metrics sink.
pub struct TunnelGuard<D> {
    driver: D,
    metrics: Arc<dyn MetricsSink>,
    display_names: HashMap<String, String>,
}

impl<D: TunnelDriver> TunnelGuard<D> {
    pub fn new(driver: D, metrics: Arc<dyn MetricsSink>) -> Self {
        Self {
            driver,
            metrics,
            display_names: HashMap::new(),
        }
    }

    /// Set public key aliases used as metric labels (builder pattern)
    pub fn with_display_names(mut self, display_names: HashMap<String, String>) -> Self {
        self.display_names = display_names;
        self
    }

    /// Runs cycles until `cancel` fires.
    ///
    /// The first cycle starts immediately. Cancellation is only observed
    /// between cycles; a cycle that has started always completes.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            timeout_secs = HANDSHAKE_TIMEOUT.as_secs(),
            "Starting handshake watchdog"
        );

        loop {
            let delay = self.run_cycle().await;
            debug!(delay_secs = delay.as_secs(), "Next check scheduled");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Handshake watchdog stopped");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Runs one cycle against the current wall clock.
    pub async fn run_cycle(&self) -> Duration {
        self.run_cycle_at(SystemTime::now()).await
    }

    /// Runs one cycle as if the current time were `now`; returns the delay
    /// until the next cycle.
    pub async fn run_cycle_at(&self, now: SystemTime) -> Duration {
        self.metrics.set_heartbeat(now);

        let peers = match self.driver.get_peers().await {
            Ok(peers) => peers,
            Err(e) => {
                error!(error = %e, "Can't get WireGuard peers");
                self.metrics.increment_error(ERROR_GET_PEERS);
                self.repair_tunnel().await;
                return DEFAULT_WAIT;
            }
        };

        let mut max_age: Option<Duration> = None;
        for peer in &peers {
            let (Some(seen), Some(age)) = (peer.last_handshake, peer.handshake_age(now)) else {
                continue;
            };

            debug!(
                pub_key = %peer.public_key,
                age_secs = age.as_secs(),
                "Time since latest handshake"
            );
            max_age = Some(max_age.map_or(age, |max| max.max(age)));
            self.metrics.set_latest_handshake(
                &peer.public_key,
                self.display_name(&peer.public_key),
                seen,
            );

            if age >= HANDSHAKE_TIMEOUT {
                self.reset_peer(peer).await;
            }
        }

        next_delay(max_age)
    }

    fn display_name(&self, public_key: &str) -> Option<&str> {
        self.display_names.get(public_key).map(String::as_str)
    }

    /// Starts the tunnel when it does not report as up.
    ///
    /// A failing probe counts as down. Errors are logged only.
    async fn repair_tunnel(&self) {
        let up = match self.driver.is_tunnel_up().await {
            Ok(up) => up,
            Err(e) => {
                error!(error = %e, "Error while checking if tunnel is up");
                false
            }
        };

        if up {
            return;
        }

        warn!("Tunnel appears to be down, trying to start tunnel");
        if let Err(e) = self.driver.start_tunnel().await {
            error!(error = %e, "Starting tunnel failed");
        }
    }

    async fn reset_peer(&self, peer: &Peer) {
        let public_key = peer.public_key.as_str();

        let endpoint = match self.driver.get_endpoint(public_key).await {
            Ok(endpoint) => endpoint,
            Err(e) => {
                error!(pub_key = %public_key, error = %e, "Could not get endpoint");
                self.metrics.increment_error(ERROR_GET_ENDPOINT);
                self.repair_tunnel().await;
                return;
            }
        };

        let Some(endpoint) = endpoint.filter(|e| !e.is_empty()) else {
            return;
        };

        match classify(&endpoint) {
            Ok(EndpointKind::Static) => {
                info!(
                    pub_key = %public_key,
                    endpoint = %endpoint,
                    "Not resetting peer, endpoint is static"
                );
                return;
            }
            Ok(EndpointKind::Dynamic) => {}
            // Unknown formats are still reset
            Err(e) => debug!(pub_key = %public_key, error = %e, "Unclassified endpoint"),
        }

        self.metrics
            .increment_peer_reset(public_key, self.display_name(public_key));
        info!(pub_key = %public_key, endpoint = %endpoint, "Resetting peer");

        if let Err(e) = self.driver.reset_peer(public_key, &endpoint).await {
            error!(pub_key = %public_key, error = %e, "Failed to reset peer");
            self.metrics.increment_error(ERROR_RESET_PEER);
            self.repair_tunnel().await;
        }
    }
}
