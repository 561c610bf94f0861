//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Connection workers produce:
//!     → logging.rs (structured log events inside a per-connection span)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (one event per entry, never interleaved)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - Metric updates are fire-and-forget; without an installed recorder they
//!   are no-ops
//! - Connection IDs flow through every event via the worker span

pub mod logging;
pub mod metrics;
