//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the filtering proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Input files: blocklist, censor wordlist and cache root.
    pub files: FilesConfig,

    /// Message size limits.
    pub limits: LimitsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Status lines used for synthesized responses.
    pub responses: ResponsesConfig,

    /// Word censor settings.
    pub censor: CensorConfig,

    /// Response cache settings.
    pub cache: CacheConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub bind_host: String,

    /// Port to listen on.
    pub port: u16,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl ListenerConfig {
    /// The `host:port` string handed to the socket layer.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 8888,
            max_connections: 1024,
        }
    }
}

/// Paths of the line-oriented input files and the cache directory.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FilesConfig {
    /// One hostname per line.
    pub blocklist: PathBuf,

    /// One censored word per line.
    pub words: PathBuf,

    /// Directory holding cached responses.
    pub cache_dir: PathBuf,
}

/// Message size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Upper bound on the header block, terminator excluded.
    pub max_header_bytes: usize,

    /// Upper bound on a raw (possibly compressed) body.
    pub max_body_bytes: usize,

    /// Upper bound on a decompressed body.
    pub max_decompressed_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            // Apache caps a request head at 8190 bytes
            max_header_bytes: 8200,
            max_body_bytes: 32 * 1024 * 1024,
            max_decompressed_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Timeout configuration for socket operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// DNS resolution plus connection establishment, in seconds.
    pub connect_secs: u64,

    /// Maximum wait for any single socket read, in seconds.
    pub read_secs: u64,

    /// Maximum wait for a complete socket write, in seconds.
    pub write_secs: u64,

    /// How long in-flight workers may run after shutdown is requested.
    pub shutdown_grace_secs: u64,
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn read(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }

    pub fn write(&self) -> Duration {
        Duration::from_secs(self.write_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            read_secs: 30,
            write_secs: 30,
            shutdown_grace_secs: 10,
        }
    }
}

/// Status codes (with reason phrase) for synthesized responses.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponsesConfig {
    pub blocked_status: String,
    pub bad_request_status: String,
    pub bad_gateway_status: String,
    pub gateway_timeout_status: String,
}

impl Default for ResponsesConfig {
    fn default() -> Self {
        Self {
            blocked_status: "403 Forbidden".to_string(),
            bad_request_status: "400 Bad Request".to_string(),
            bad_gateway_status: "502 Bad Gateway".to_string(),
            gateway_timeout_status: "504 Gateway Timeout".to_string(),
        }
    }
}

/// Word censor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CensorConfig {
    /// Censor text-like response bodies.
    pub enabled: bool,

    /// Literal written over every matched word.
    pub marker: String,
}

impl Default for CensorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            marker: "CENSORED".to_string(),
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve and store cached responses.
    pub enabled: bool,

    /// Entry lifetime in seconds; 0 keeps entries forever.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3600,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
