//! Per-connection proxy pipeline.
//!
//! # Data Flow
//! ```text
//! client socket
//!     → read request (framer → parser → body)
//!     → target.rs (absolute-form → origin-form, pick upstream)
//!     → referer rewrite → blocklist ──blocked──▶ synthesized 403
//!     → cache lookup ──hit──▶ stored bytes
//!     → connect upstream → forward request → read response (decoded)
//!     → censor text bodies → cache store
//!     → reply to client, close
//! ```
//!
//! # Design Decisions
//! - One request and one response per connection; both sides close after
//! - Shared state is built once at startup and only read by workers
//! - Failures after the request is parsed still answer the client with a
//!   synthesized status; client socket failures just close

pub mod pipeline;
pub mod target;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::cache::ResponseCache;
use crate::config::{ProxyConfig, ResponsesConfig};
use crate::filter::{Blocklist, WordCensor};
use crate::http::ReadLimits;
use crate::net::ConnectionId;

pub use pipeline::{serve_connection, Stage};

/// Process-wide, read-only state shared by every connection worker.
#[derive(Debug)]
pub struct ProxyState {
    pub blocklist: Blocklist,
    pub censor: Option<WordCensor>,
    pub cache: Option<ResponseCache>,
    pub responses: ResponsesConfig,
    pub limits: ReadLimits,
    pub connect_timeout: std::time::Duration,
    pub write_timeout: std::time::Duration,
}

impl ProxyState {
    /// Assemble state from a validated config and the already-loaded lists.
    pub fn new(
        config: &ProxyConfig,
        blocklist: Blocklist,
        censor: WordCensor,
        cache: Option<ResponseCache>,
    ) -> Self {
        let censor = (config.censor.enabled && !censor.is_empty()).then_some(censor);
        Self {
            blocklist,
            censor,
            cache,
            responses: config.responses.clone(),
            limits: ReadLimits::from_config(&config.limits, config.timeouts.read()),
            connect_timeout: config.timeouts.connect(),
            write_timeout: config.timeouts.write(),
        }
    }
}

/// What one worker knows about its connection.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub id: ConnectionId,
    pub peer: SocketAddr,
    pub state: Arc<ProxyState>,
}
