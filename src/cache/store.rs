//! Response files on disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::cache::{CacheKey, FlightGuard, SingleFlight};
use crate::config::CacheConfig;
use crate::error::{ProxyError, Result};
use crate::observability::metrics;

/// Serialized responses stored one file per key under `root`.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    root: PathBuf,
    ttl: Option<Duration>,
    flights: SingleFlight,
}

impl ResponseCache {
    pub fn new(root: impl Into<PathBuf>, ttl: Option<Duration>) -> Self {
        Self {
            root: root.into(),
            ttl,
            flights: SingleFlight::new(),
        }
    }

    pub fn from_config(root: impl Into<PathBuf>, config: &CacheConfig) -> Self {
        let ttl = (config.ttl_secs > 0).then(|| Duration::from_secs(config.ttl_secs));
        Self::new(root, ttl)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    /// Lock `key` against concurrent fetches; hold the guard until stored.
    pub async fn claim(&self, key: &CacheKey) -> FlightGuard {
        self.flights.acquire(key).await
    }

    /// The stored response bytes, or `None` when absent or expired.
    pub async fn lookup(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(key);
        let found = self.read_fresh(&path).await;
        if let Ok(found) = &found {
            metrics::record_cache_lookup(found.is_some());
        }
        found
    }

    async fn read_fresh(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        let meta = match tokio::fs::metadata(path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ProxyError::Cache(e)),
        };

        if let Some(ttl) = self.ttl {
            let modified = meta.modified().map_err(ProxyError::Cache)?;
            let age = SystemTime::now()
                .duration_since(modified)
                .unwrap_or_default();
            if age > ttl {
                tracing::debug!(path = ?path, age_secs = age.as_secs(), "Cache entry expired");
                return Ok(None);
            }
        }

        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            // Removed between the metadata call and the read.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ProxyError::Cache(e)),
        }
    }

    /// Publish `bytes` under `key`: write a temp file, then rename it in place.
    pub async fn store(&self, key: &CacheKey, bytes: &[u8]) -> Result<()> {
        let tmp = self.root.join(format!(".tmp-{}", uuid::Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&tmp, bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(ProxyError::Cache(e));
        }

        let target = self.entry_path(key);
        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(ProxyError::Cache(e));
        }

        tracing::debug!(key = %key, bytes = bytes.len(), "Cached response stored");
        Ok(())
    }
}
