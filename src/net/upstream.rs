//! Upstream (origin server) addressing and connection.
//!
//! # Responsibilities
//! - Turn a `Host` value into a host and port (default 80)
//! - Resolve and connect under one deadline
//!
//! # Design Decisions
//! - Every resolved address is tried in order; the last error is reported
//! - DNS and connect share the connect timeout

use std::time::Duration;

use tokio::net::TcpStream;

use crate::error::{ProxyError, Result};
use crate::resilience::with_deadline;

pub const DEFAULT_PORT: u16 = 80;

/// Where a request is forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse `host[:port]`. An empty port means 80; a non-numeric one is rejected.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let (host, port) = match value.split_once(':') {
            Some((host, "")) => (host, DEFAULT_PORT),
            Some((host, port)) => (host, port.parse().ok()?),
            None => (value, DEFAULT_PORT),
        };
        if host.is_empty() {
            return None;
        }
        Some(Self::new(host, port))
    }

    /// `host:port`, as handed to the resolver and used in cache keys.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Resolve `target` and open a TCP connection to the first address that accepts.
pub async fn connect(target: &Target, timeout: Duration) -> Result<TcpStream> {
    with_deadline("upstream connect", timeout, async {
        let addrs = tokio::net::lookup_host(target.authority())
            .await
            .map_err(|e| ProxyError::UpstreamConnect {
                target: target.authority(),
                reason: format!("resolution failed: {}", e),
            })?;

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    tracing::debug!(target = %target, address = %addr, "Upstream connected");
                    return Ok(stream);
                }
                Err(e) => {
                    tracing::debug!(target = %target, address = %addr, error = %e, "Upstream address refused");
                    last_error = Some(e);
                }
            }
        }

        Err(ProxyError::UpstreamConnect {
            target: target.authority(),
            reason: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no addresses resolved".to_string()),
        })
    })
    .await
}
