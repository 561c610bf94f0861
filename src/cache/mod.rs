//! On-disk response cache.
//!
//! # Data Flow
//! ```text
//! GET request (host, rewritten path)
//!     → key.rs (SHA-256 hex of "host\npath")
//!     → flight.rs (per-key lock, held until the exchange finishes)
//!     → store.rs lookup: fresh file → serve bytes, no upstream contact
//!     → miss: forward, then store.rs store (temp file + rename)
//! ```
//!
//! # Design Decisions
//! - One file per entry under the cache root: `<hex>.http`
//! - Entries expire by file age; a TTL of zero keeps them forever
//! - Concurrent misses for one key fetch once; later waiters see the entry
//! - Readers never observe a partial file because writes publish by rename

pub mod flight;
pub mod key;
pub mod store;

pub use flight::{FlightGuard, SingleFlight};
pub use key::CacheKey;
pub use store::ResponseCache;
