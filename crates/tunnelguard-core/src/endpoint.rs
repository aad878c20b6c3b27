//! Endpoint classifier.
//!
//! A peer endpoint pinned to a literal IP address is static: re-applying it
//! cannot change where packets go, so the control loop never resets it. An
//! endpoint naming a host is dynamic and is re-applied so that the tunnel
//! layer resolves it again.

use std::net::IpAddr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::EndpointError;

/// Single DNS label: alphanumeric, internal hyphens only.
static HOSTNAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?$").expect("Invalid regex pattern")
});

/// Classification of a `host:port` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// Host is a literal IPv4 or IPv6 address.
    Static,
    /// Host is a hostname that is resolved by the tunnel layer.
    Dynamic,
}

/// Classifies an endpoint as static or dynamic.
///
/// # Errors
///
/// [`EndpointError::Malformed`] when no `host:port` pair can be extracted or
/// when the host is neither an IP literal nor a valid hostname.
///
/// # Example
///
/// ```
/// use tunnelguard_core::endpoint::{classify, EndpointKind};
///
/// assert_eq!(classify("1.1.1.1:443").unwrap(), EndpointKind::Static);
/// assert_eq!(classify("[2001:db8::1]:443").unwrap(), EndpointKind::Static);
/// assert_eq!(classify("my-endpoint:443").unwrap(), EndpointKind::Dynamic);
/// assert!(classify("my-endpoint").is_err());
/// ```
pub fn classify(endpoint: &str) -> Result<EndpointKind, EndpointError> {
    let (host, _port) = split_host_port(endpoint)?;

    if host.parse::<IpAddr>().is_ok() {
        return Ok(EndpointKind::Static);
    }

    if HOSTNAME_RE.is_match(host) {
        return Ok(EndpointKind::Dynamic);
    }

    Err(EndpointError::malformed(endpoint, "unknown format"))
}

/// Splits `host:port`, `[host]:port` or `[ipv6]:port` into host and port.
///
/// The port may be empty. The host of an unbracketed pair must not contain a
/// colon, so a bare IPv6 literal with a port is rejected.
pub fn split_host_port(endpoint: &str) -> Result<(&str, &str), EndpointError> {
    let colon = endpoint
        .rfind(':')
        .ok_or_else(|| EndpointError::malformed(endpoint, "missing port in address"))?;

    let (host, host_start, host_end) = if endpoint.starts_with('[') {
        let close = endpoint
            .find(']')
            .ok_or_else(|| EndpointError::malformed(endpoint, "missing ']' in address"))?;

        if close + 1 == endpoint.len() {
            return Err(EndpointError::malformed(endpoint, "missing port in address"));
        }
        if close + 1 != colon {
            if endpoint.as_bytes()[close + 1] == b':' {
                return Err(EndpointError::malformed(endpoint, "too many colons in address"));
            }
            return Err(EndpointError::malformed(endpoint, "missing port in address"));
        }

        (&endpoint[1..close], 1, close + 1)
    } else {
        let host = &endpoint[..colon];
        if host.contains(':') {
            return Err(EndpointError::malformed(endpoint, "too many colons in address"));
        }
        (host, 0, 0)
    };

    if endpoint[host_start..].contains('[') {
        return Err(EndpointError::malformed(endpoint, "unexpected '[' in address"));
    }
    if endpoint[host_end..].contains(']') {
        return Err(EndpointError::malformed(endpoint, "unexpected ']' in address"));
    }

    Ok((host, &endpoint[colon + 1..]))
}
