// Whole-page response cache for the home feed
// Entries are rendered bodies keyed by path and query, bounded by an LRU and a TTL

use axum::body::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use crate::infrastructure::cache::Cache;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub body: Bytes,
    pub inserted_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new(body: Bytes, ttl: Duration) -> Self {
        Self {
            body,
            inserted_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

#[derive(Clone)]
pub struct PageCache {
    entries: Arc<Mutex<Cache<String, CacheEntry>>>,
    // Bumped by every clear(); only changed while the entries lock is held
    generation: Arc<AtomicU64>,
    ttl: Duration,
}

impl std::fmt::Debug for PageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCache").field("ttl", &self.ttl).finish()
    }
}

impl PageCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Cache::new(capacity))),
            generation: Arc::new(AtomicU64::new(0)),
            ttl,
        }
    }

    /// Cached body for `key`; expired entries are dropped on the way.
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        let mut entries = self.entries.lock().await;
        let key = key.to_string();
        let expired = match entries.get(&key) {
            Some(entry) if !entry.is_expired() => {
                debug!("Page cache hit for {}", key);
                return Some(entry.body.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(&key);
        }
        None
    }

    pub async fn insert(&self, key: &str, body: Bytes) {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), CacheEntry::new(body, self.ttl));
    }

    /// Current generation; pass it to `insert_if_fresh` after rendering.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Stores `body` only if no `clear()` happened since `generation` was
    /// read, so a page rendered from data older than the last clear is never
    /// cached.
    pub async fn insert_if_fresh(&self, key: &str, body: Bytes, generation: u64) -> bool {
        let mut entries = self.entries.lock().await;
        if self.generation.load(Ordering::Acquire) != generation {
            debug!("Skipping stale render of {}", key);
            return false;
        }
        entries.insert(key.to_string(), CacheEntry::new(body, self.ttl));
        true
    }

    pub async fn clear(&self) {
        debug!("Clearing page cache");
        let mut entries = self.entries.lock().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        entries.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
