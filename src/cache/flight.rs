//! Per-key coalescing of concurrent cache misses.
//!
//! The first worker to lock a key performs the upstream fetch while later
//! workers for the same key wait; when they get the lock the entry is
//! already on disk. Locks are dropped from the map once nobody holds or
//! awaits them.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::cache::CacheKey;

type FlightMap = DashMap<CacheKey, Arc<Mutex<()>>>;

#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    flights: Arc<FlightMap>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive ownership of `key`.
    pub async fn acquire(&self, key: &CacheKey) -> FlightGuard {
        let lock = self
            .flights
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = lock.lock_owned().await;
        FlightGuard {
            key: key.clone(),
            flights: Arc::clone(&self.flights),
            guard: Some(guard),
        }
    }

    /// Keys with a holder or waiters.
    pub fn in_flight(&self) -> usize {
        self.flights.len()
    }
}

/// Exclusive ownership of one cache key; released on drop.
#[derive(Debug)]
pub struct FlightGuard {
    key: CacheKey,
    flights: Arc<FlightMap>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl FlightGuard {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters clone the Arc under the shard lock, so a count of one means
        // only the map still refers to it.
        self.flights
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
