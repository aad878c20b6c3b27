//! Control loop scheduling and cancellation tests.
//!
//! Uses a hand-written driver double and tokio's paused clock so that the
//! adaptive delays can be observed without waiting in real time.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tunnelguard_core::{
    DriverError, DriverResult, GuardMetrics, Peer, TunnelDriver, TunnelGuard, ERROR_GET_PEERS,
};

#[derive(Default)]
struct FakeDriver {
    peers: Vec<Peer>,
    fail_get_peers: bool,
    /// Signalled when `get_peers` is entered.
    entered: Option<Arc<Notify>>,
    /// When set, `get_peers` waits for a notification before returning.
    gate: Option<Arc<Notify>>,
    get_peers_calls: AtomicUsize,
    reset_calls: AtomicUsize,
    start_calls: AtomicUsize,
}

impl FakeDriver {
    fn with_peers(peers: Vec<Peer>) -> Self {
        Self {
            peers,
            ..Default::default()
        }
    }

    fn get_peers_calls(&self) -> usize {
        self.get_peers_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TunnelDriver for FakeDriver {
    async fn get_peers(&self) -> DriverResult<Vec<Peer>> {
        self.get_peers_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(entered) = &self.entered {
            entered.notify_one();
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail_get_peers {
            return Err(DriverError::CommandFailed {
                command: "wg show wg0 latest-handshakes".to_string(),
                exit_code: 1,
                output: "Unable to access interface: No such device".to_string(),
            });
        }
        Ok(self.peers.clone())
    }

    async fn get_endpoint(&self, public_key: &str) -> DriverResult<Option<String>> {
        self.peers
            .iter()
            .find(|p| p.public_key == public_key)
            .map(|p| p.endpoint.clone())
            .ok_or_else(|| DriverError::peer_not_found(public_key))
    }

    async fn reset_peer(&self, _public_key: &str, _endpoint: &str) -> DriverResult<()> {
        self.reset_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn start_tunnel(&self) -> DriverResult<()> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn is_tunnel_up(&self) -> DriverResult<bool> {
        Ok(false)
    }
}

fn spawn_guard(
    driver: Arc<FakeDriver>,
    metrics: Arc<GuardMetrics>,
) -> (CancellationToken, tokio::task::JoinHandle<()>) {
    let cancel = CancellationToken::new();
    let guard = TunnelGuard::new(driver, metrics);
    let handle = tokio::spawn(guard.run(cancel.clone()));
    (cancel, handle)
}

#[tokio::test(start_paused = true)]
async fn test_first_cycle_runs_immediately() {
    let driver = Arc::new(FakeDriver::default());
    let metrics = Arc::new(GuardMetrics::new());
    let (cancel, handle) = spawn_guard(driver.clone(), metrics.clone());

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(driver.get_peers_calls(), 1);
    assert!(metrics.snapshot().heartbeat.is_some());

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_adaptive_delay_between_cycles() {
    let seen = SystemTime::now() - Duration::from_secs(42);
    let driver = Arc::new(FakeDriver::with_peers(vec![
        Peer::new("aaa=").with_last_handshake(SystemTime::now() - Duration::from_secs(21)),
        Peer::new("bbb=").with_last_handshake(seen),
        Peer::new("ccc="),
    ]));
    let metrics = Arc::new(GuardMetrics::new());
    let (cancel, handle) = spawn_guard(driver.clone(), metrics);

    // 180 - 42 + 1 = 139 seconds until the second cycle
    tokio::time::sleep(Duration::from_secs(138)).await;
    assert_eq!(driver.get_peers_calls(), 1);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(driver.get_peers_calls(), 2);
    assert_eq!(driver.reset_calls.load(Ordering::SeqCst), 0);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_failures_retry_every_default_wait() {
    let driver = Arc::new(FakeDriver {
        fail_get_peers: true,
        ..Default::default()
    });
    let metrics = Arc::new(GuardMetrics::new());
    let (cancel, handle) = spawn_guard(driver.clone(), metrics.clone());

    tokio::time::sleep(Duration::from_secs(29)).await;
    assert_eq!(driver.get_peers_calls(), 1);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(driver.get_peers_calls(), 2);
    assert_eq!(metrics.error_count(ERROR_GET_PEERS), 2);
    assert_eq!(driver.start_calls.load(Ordering::SeqCst), 2);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_sleep_stops_loop() {
    let driver = Arc::new(FakeDriver::default());
    let metrics = Arc::new(GuardMetrics::new());
    let (cancel, handle) = spawn_guard(driver.clone(), metrics);

    tokio::time::sleep(Duration::from_secs(5)).await;
    cancel.cancel();
    handle.await.unwrap();

    // Well past the 30s fallback delay, no further cycle ran
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(driver.get_peers_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_cycle_lets_cycle_finish() {
    let entered = Arc::new(Notify::new());
    let gate = Arc::new(Notify::new());
    let driver = Arc::new(FakeDriver {
        peers: vec![Peer::new("bbb=")
            .with_last_handshake(SystemTime::now() - Duration::from_secs(400))
            .with_endpoint("my-endpoint:51820")],
        entered: Some(entered.clone()),
        gate: Some(gate.clone()),
        ..Default::default()
    });
    let metrics = Arc::new(GuardMetrics::new());
    let (cancel, handle) = spawn_guard(driver.clone(), metrics.clone());

    entered.notified().await;
    cancel.cancel();
    gate.notify_one();
    handle.await.unwrap();

    // The in-flight cycle still reset the stale peer, then the loop stopped
    assert_eq!(driver.get_peers_calls(), 1);
    assert_eq!(driver.reset_calls.load(Ordering::SeqCst), 1);
    assert_eq!(metrics.reset_count("bbb="), 1);
}
