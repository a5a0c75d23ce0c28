use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Raw response bodies keyed by the exact URL they were fetched from.
#[async_trait]
pub trait FetchCache: Send + Sync {
    async fn get(&self, url: &str) -> Option<Bytes>;
    async fn put(&self, url: &str, body: Bytes);
}

struct CacheEntry {
    body: Bytes,
    fetched_at: Instant,
}

/// Process-wide cache guarded by a single lock. Expired entries are dropped
/// when their key is next looked up; nothing sweeps in the background.
pub struct TtlCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl FetchCache for TtlCache {
    async fn get(&self, url: &str) -> Option<Bytes> {
        let mut entries = self.entries.lock().await;

        if let Some(entry) = entries.get(url) {
            if entry.fetched_at.elapsed() < self.ttl {
                debug!("Cache hit: {}", url);
                return Some(entry.body.clone());
            }
            debug!("Cache entry expired: {}", url);
            entries.remove(url);
        }
        None
    }

    async fn put(&self, url: &str, body: Bytes) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            url.to_string(),
            CacheEntry {
                body,
                fetched_at: Instant::now(),
            },
        );
    }
}

/// Never stores anything, so every fetch goes to the network.
pub struct NoCache;

#[async_trait]
impl FetchCache for NoCache {
    async fn get(&self, _url: &str) -> Option<Bytes> {
        None
    }

    async fn put(&self, _url: &str, _body: Bytes) {}
}
