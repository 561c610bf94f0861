//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Load lists → Prepare cache root → Shared state
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain workers → Abort stragglers
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Everything shared is built before the first connection is accepted
//! - Shutdown has a grace period, then remaining workers are aborted

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{prepare_state, StartupError};
