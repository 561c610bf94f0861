//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (worker registry, connection IDs)
//!     → proxy pipeline
//!         → io.rs (deadline-bounded reads and writes)
//!         → upstream.rs (resolve + connect to the origin server)
//! ```
//!
//! # Design Decisions
//! - Bounded accept prevents resource exhaustion
//! - Each worker is registered so shutdown can drain them
//! - Every socket operation runs under a deadline

pub mod connection;
pub mod io;
pub mod listener;
pub mod upstream;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{ConnectionPermit, Listener, ListenerError};
pub use upstream::Target;
