//! Lazily opened pool contexts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use objfs_store::{ContextHandle, ObjectClient, StoreError, StoreResult};
use tracing::debug;

/// Caches one open context per pool for the life of the client.
///
/// A single mutex guards the whole map, and it stays held while a missing
/// context is opened. Concurrent first accesses to one pool therefore open
/// it exactly once, at the cost of serializing first accesses to unrelated
/// pools. Failed opens are not cached.
pub struct PoolContextCache {
    client: Box<dyn ObjectClient>,
    contexts: Mutex<HashMap<String, ContextHandle>>,
}

impl PoolContextCache {
    /// Wrap a connected client.
    pub fn new(client: Box<dyn ObjectClient>) -> Self {
        Self {
            client,
            contexts: Mutex::new(HashMap::new()),
        }
    }

    /// Return the context for `pool`, opening it on first use.
    pub fn get(&self, pool: &str) -> StoreResult<ContextHandle> {
        let mut contexts = self
            .contexts
            .lock()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))?;
        if let Some(ctx) = contexts.get(pool) {
            return Ok(Arc::clone(ctx));
        }
        let ctx = self.client.open_context(pool)?;
        debug!(pool, "opened pool context");
        contexts.insert(pool.to_string(), Arc::clone(&ctx));
        Ok(ctx)
    }

    /// Names of the pools with an open context, sorted.
    pub fn pools(&self) -> Vec<String> {
        let mut pools: Vec<String> = match self.contexts.lock() {
            Ok(contexts) => contexts.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        pools.sort();
        pools
    }
}

impl std::fmt::Debug for PoolContextCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolContextCache")
            .field("pools", &self.pools())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use objfs_store::InMemoryCluster;

    fn cache_for(cluster: &InMemoryCluster) -> PoolContextCache {
        PoolContextCache::new(Box::new(cluster.connected_client().unwrap()))
    }

    #[test]
    fn repeated_gets_share_one_context() {
        let cluster = InMemoryCluster::new();
        cluster.create_pool("pool1").unwrap();
        let cache = cache_for(&cluster);

        let a = cache.get("pool1").unwrap();
        let b = cache.get("pool1").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cluster.contexts_opened(), 1);
    }

    #[test]
    fn pools_are_cached_independently() {
        let cluster = InMemoryCluster::new();
        cluster.create_pool("a").unwrap();
        cluster.create_pool("b").unwrap();
        let cache = cache_for(&cluster);

        let a = cache.get("a").unwrap();
        let b = cache.get("b").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.pool_name(), "a");
        assert_eq!(cache.pools(), vec!["a", "b"]);
    }

    #[test]
    fn open_failures_are_not_cached() {
        let cluster = InMemoryCluster::new();
        cluster.create_pool("pool1").unwrap();
        let cache = cache_for(&cluster);

        cluster.fail_next_opens(1);
        assert!(cache.get("pool1").is_err());
        assert!(cache.pools().is_empty());

        assert!(cache.get("pool1").is_ok());
        assert_eq!(cluster.contexts_opened(), 1);
    }

    #[test]
    fn unknown_pool_error_is_surfaced() {
        let cluster = InMemoryCluster::new();
        let cache = cache_for(&cluster);
        assert!(matches!(
            cache.get("missing"),
            Err(StoreError::PoolNotFound(_))
        ));
    }

    #[test]
    fn concurrent_first_access_opens_once() {
        let cluster = InMemoryCluster::new();
        cluster.create_pool("pool1").unwrap();
        let cache = Arc::new(cache_for(&cluster));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get("pool1").is_ok())
            })
            .collect();
        for h in handles {
            assert!(h.join().expect("thread should not panic"));
        }
        assert_eq!(cluster.contexts_opened(), 1);
    }
}
