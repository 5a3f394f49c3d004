use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use serde_json::Value;

use dcx_core::ports::adapter::{AdapterError, CacheAdapter, ProtocolAdapter};

#[derive(Clone)]
struct Entry {
    value: Value,
    ttl: Option<Duration>,
}

/// Per-entry TTL, computed once at insertion via `moka`'s `Expiry` hook
/// rather than a single cache-wide TTL — callers set a different expiry per
/// `set` call.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
        value.ttl
    }
}

/// `moka`-backed in-process cache. No real connection to open; `connect`
/// and `disconnect` only track `is_connected` for the uniform
/// `ProtocolAdapter` lifecycle other adapters observe.
pub struct MokaCacheAdapter {
    cache: Cache<String, Entry>,
    connected: AtomicBool,
}

impl MokaCacheAdapter {
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_capacity).expire_after(PerEntryTtl).build(),
            connected: AtomicBool::new(false),
        }
    }
}

impl Default for MokaCacheAdapter {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl ProtocolAdapter for MokaCacheAdapter {
    async fn connect(&self) -> Result<(), AdapterError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), AdapterError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheAdapter for MokaCacheAdapter {
    async fn get(&self, key: &str) -> Result<Option<Value>, AdapterError> {
        Ok(self.cache.get(key).await.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), AdapterError> {
        self.cache.insert(key.to_string(), Entry { value, ttl }).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AdapterError> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn clear(&self) -> Result<(), AdapterError> {
        self.cache.invalidate_all();
        Ok(())
    }
}
