//! Peer and handshake model.

use std::time::{Duration, SystemTime};

/// A WireGuard peer as seen by one polling cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// Peer public key, unique within an interface.
    pub public_key: String,
    /// Last successful handshake, `None` until the first one is observed.
    pub last_handshake: Option<SystemTime>,
    /// Configured `host:port` endpoint, if any.
    pub endpoint: Option<String>,
}

impl Peer {
    /// Create a peer with no handshake and no endpoint.
    pub fn new(public_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            last_handshake: None,
            endpoint: None,
        }
    }

    /// Set the last handshake instant (builder pattern)
    pub fn with_last_handshake(mut self, last_handshake: SystemTime) -> Self {
        self.last_handshake = Some(last_handshake);
        self
    }

    /// Set the endpoint (builder pattern)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Time elapsed since the last handshake, truncated to whole seconds.
    ///
    /// Returns `None` when no handshake has been observed. A handshake that
    /// lies in the future relative to `now` has age zero.
    pub fn handshake_age(&self, now: SystemTime) -> Option<Duration> {
        let seen = self.last_handshake?;
        let age = now.duration_since(seen).unwrap_or(Duration::ZERO);
        Some(Duration::from_secs(age.as_secs()))
    }
}
