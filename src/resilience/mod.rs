//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Every blocking step of a connection:
//!     → timeouts.rs (deadline around read / write / DNS / connect)
//!     → On expiry: ProxyError::Timeout, connection pipeline ends
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - A slow peer costs one worker for at most one deadline per step
//! - No retries: a forwarded request may not be idempotent

pub mod timeouts;

pub use timeouts::with_deadline;
