//! Cache keys.

use sha2::{Digest, Sha256};

/// Identity of a cached response: SHA-256 of the target authority and path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(authority: &str, path: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(authority.as_bytes());
        hasher.update(b"\n");
        hasher.update(path.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the entry inside the cache root.
    pub fn file_name(&self) -> String {
        format!("{}.http", self.0)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
