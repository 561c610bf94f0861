//! Request and response filtering.
//!
//! # Data Flow
//! ```text
//! Parsed request:
//!     → referer.rs (restore site subpath from Referer)
//!     → blocklist.rs (exact host match → synthesized blocked response)
//!
//! Decoded response:
//!     → censor.rs (redact configured words in text-like bodies)
//! ```
//!
//! # Design Decisions
//! - Pure transforms over already-parsed messages; no I/O
//! - Lists are loaded once at startup and never mutated
//! - Matching is exact for hosts, ASCII case-insensitive for words

pub mod blocklist;
pub mod censor;
pub mod referer;

pub use blocklist::Blocklist;
pub use censor::{is_text_like, WordCensor};
pub use referer::rewrite_from_referer;
