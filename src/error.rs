//! Crate-wide error types.
//!
//! Each variant maps onto one step of the connection pipeline so the
//! orchestrator can decide whether a reply is still owed to the client.

use std::time::Duration;

use thiserror::Error;

/// Failure while reversing a `Content-Encoding`.
#[derive(Error, Debug)]
pub enum DecompressionError {
    #[error("compressed stream ended before its end-of-stream marker")]
    Truncated,

    #[error("corrupt compressed stream: {0}")]
    Corrupt(String),

    #[error("unsupported content encoding '{0}'")]
    Unsupported(String),

    #[error("decompressed body exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

#[derive(Error, Debug)]
pub enum ProxyError {
    /// Unparseable start line, missing header terminator, or an over-limit message.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("socket read failed: {0}")]
    SocketRead(#[source] std::io::Error),

    #[error("socket write failed: {0}")]
    SocketWrite(#[source] std::io::Error),

    #[error("cannot connect to upstream {target}: {reason}")]
    UpstreamConnect { target: String, reason: String },

    #[error("decompression failed: {0}")]
    Decompression(#[from] DecompressionError),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("cache I/O failed: {0}")]
    Cache(#[source] std::io::Error),
}

impl ProxyError {
    /// Socket failures close the connection without a reply.
    pub fn is_socket_error(&self) -> bool {
        matches!(self, ProxyError::SocketRead(_) | ProxyError::SocketWrite(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProxyError::Timeout { .. })
    }

    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::MalformedMessage(_) => "malformed",
            ProxyError::SocketRead(_) => "socket_read",
            ProxyError::SocketWrite(_) => "socket_write",
            ProxyError::UpstreamConnect { .. } => "upstream_connect",
            ProxyError::Decompression(_) => "decompression",
            ProxyError::Timeout { .. } => "timeout",
            ProxyError::Cache(_) => "cache",
        }
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
