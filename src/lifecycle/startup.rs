//! Startup orchestration.
//!
//! # Responsibilities
//! - Read the blocklist and censor wordlist
//! - Prepare the cache root
//! - Build the shared state handed to every worker
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Lists are read eagerly, so workers never see a half-loaded list
//! - The listener is bound by the caller, after this succeeds

use std::path::PathBuf;

use thiserror::Error;

use crate::cache::ResponseCache;
use crate::config::lists::{load_blocklist, load_censor, ListError};
use crate::config::ProxyConfig;
use crate::proxy::ProxyState;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    List(#[from] ListError),

    #[error("cannot create cache directory {path:?}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Load everything workers share, in dependency order.
pub fn prepare_state(config: &ProxyConfig) -> Result<ProxyState, StartupError> {
    let blocklist = load_blocklist(&config.files.blocklist)?;
    let censor = load_censor(&config.files.words, &config.censor.marker)?;

    let cache = if config.cache.enabled {
        let root = &config.files.cache_dir;
        std::fs::create_dir_all(root).map_err(|source| StartupError::CacheDir {
            path: root.clone(),
            source,
        })?;
        tracing::info!(root = ?root, ttl_secs = config.cache.ttl_secs, "Response cache ready");
        Some(ResponseCache::from_config(root.clone(), &config.cache))
    } else {
        tracing::info!("Response cache disabled");
        None
    };

    Ok(ProxyState::new(config, blocklist, censor, cache))
}
