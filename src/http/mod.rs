//! HTTP/1.x message engine and server.
//!
//! # Data Flow
//! ```text
//! socket bytes
//!     → framer.rs (find \r\n\r\n, keep spillover, bounded buffer)
//!     → parser.rs (start line + header fields)
//!     → body.rs (Content-Length or read-until-close)
//!         → decode.rs (gzip / deflate → identity)
//!     → message.rs (Message)
//!     → serialize.rs (wire bytes or log form)
//!
//! server.rs: accept loop → one worker per connection → proxy pipeline
//! ```
//!
//! # Design Decisions
//! - One message per connection; no keep-alive, pipelining or chunked decoding
//! - Every socket read and write carries a deadline
//! - Sizes are bounded at each stage: header block, raw body, decoded body

pub mod body;
pub mod decode;
pub mod framer;
pub mod message;
pub mod parser;
pub mod reader;
pub mod serialize;
pub mod server;

pub use message::{Headers, Message, MessageKind, StartLine};
pub use reader::{read_message, ReadLimits};
pub use server::ProxyServer;
