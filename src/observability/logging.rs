//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Pick the level from `RUST_LOG`, falling back to configuration
//!
//! # Design Decisions
//! - The fmt layer writes each event under the stdout lock, so a multi-line
//!   message dump from one connection never interleaves with another's
//! - Initialization is idempotent; a second call is ignored

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter directive for a configured level, e.g. `filtering_proxy=info`.
pub fn default_directive(level: &str) -> String {
    format!("{}={}", env!("CARGO_CRATE_NAME"), level)
}

pub fn init_tracing(level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    let fmt_layer = fmt::layer().with_target(true).with_level(true);

    if tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("Tracing subscriber already installed");
    }
}
