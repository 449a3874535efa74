use std::time::Duration;

use bytes::Bytes;
use moka::future::Cache;

const MAX_CACHED_PAGES: u64 = 1_000;

/// Short-lived cache of rendered page bodies.
///
/// Entries expire on their own after the configured ttl. Nothing here watches
/// the database: handlers that change what a cached page shows call
/// [`PageCache::clear`] themselves, and until they do a cached page keeps
/// serving what it rendered.
#[derive(Clone)]
pub struct PageCache {
    prefix: &'static str,
    inner: Cache<String, Bytes>,
}

impl PageCache {
    pub fn new(prefix: &'static str, ttl: Duration) -> Self {
        Self {
            prefix,
            inner: Cache::builder()
                .max_capacity(MAX_CACHED_PAGES)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Bytes> {
        self.inner.get(&self.key(key)).await
    }

    pub async fn insert(&self, key: &str, body: Bytes) {
        self.inner.insert(self.key(key), body).await;
    }

    pub fn clear(&self) {
        tracing::debug!("clearing {} cache", self.prefix);
        self.inner.invalidate_all();
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }
}
