//! Forwarding HTTP proxy with host blocking, word censoring and an on-disk
//! response cache.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;
pub mod resilience;

pub use config::schema::ProxyConfig;
pub use error::{ProxyError, Result};
pub use http::ProxyServer;
pub use lifecycle::Shutdown;
