//! Error types for tunnelguard.
//!
//! [`DriverError`] covers every failure a [`TunnelDriver`](crate::TunnelDriver)
//! can report. The control loop never propagates it; each one is counted and
//! logged. [`EndpointError`] is the classifier's failure case.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors that can occur while talking to the tunnel tooling.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Failed to spawn an external command.
    #[error("Failed to execute command '{command}': {source}")]
    CommandSpawn {
        /// The command that failed to execute.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// External command returned a non-zero exit code.
    #[error("Command failed: '{command}' (exit code {exit_code}): {output}")]
    CommandFailed {
        /// The command that failed.
        command: String,
        /// The exit code.
        exit_code: i32,
        /// Combined stdout/stderr output.
        output: String,
    },

    /// Command output could not be parsed.
    #[error("Failed to parse {what}: {message}")]
    Parse {
        /// What was being parsed (e.g. "handshake time").
        what: String,
        /// Error message.
        message: String,
    },

    /// Public key is not present in the static peer configuration.
    #[error("Public key {public_key} not found")]
    PeerNotFound {
        /// The public key that was looked up.
        public_key: String,
    },

    /// Peer configuration source could not be read.
    #[error("Failed to read configuration file {}: {source}", path.display())]
    ConfigRead {
        /// The configuration file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Driver was constructed with an invalid argument.
    #[error("Invalid argument {field}: {message}")]
    InvalidArgument {
        /// The argument that failed validation.
        field: String,
        /// Error message.
        message: String,
    },
}

impl DriverError {
    /// Creates a parse error.
    pub fn parse(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            what: what.into(),
            message: message.into(),
        }
    }

    /// Creates a peer not found error.
    pub fn peer_not_found(public_key: impl Into<String>) -> Self {
        Self::PeerNotFound {
            public_key: public_key.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors returned by the endpoint classifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    /// The endpoint is neither `host:port` with a literal IP nor a valid hostname.
    #[error("Malformed endpoint '{endpoint}': {reason}")]
    Malformed {
        /// The endpoint string as given.
        endpoint: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

impl EndpointError {
    pub(crate) fn malformed(endpoint: &str, reason: &'static str) -> Self {
        Self::Malformed {
            endpoint: endpoint.to_string(),
            reason,
        }
    }
}
