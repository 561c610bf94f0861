//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line (port, list files, cache dir) + optional TOML file
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → lists.rs (blocklist + wordlist, read once)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to every connection worker
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; nothing is read lazily at request time
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod lists;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    CacheConfig, CensorConfig, FilesConfig, LimitsConfig, ListenerConfig, ObservabilityConfig,
    ProxyConfig, ResponsesConfig, TimeoutConfig,
};
