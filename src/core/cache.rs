//! In-memory TTL cache for parsed results, keyed by (slug, bracket).

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub slug: String,
    pub bracket: String,
}

impl CacheKey {
    pub fn new(slug: &str, bracket: &str) -> Self {
        Self {
            slug: slug.to_string(),
            bracket: bracket.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    created_at: DateTime<Utc>,
    value: V,
}

/// 過期項目只在下一次寫入時覆蓋，沒有背景清理
pub struct ResultCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry<V>>>,
    clock: Clock,
}

impl<V: Clone> ResultCache<V> {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self::with_clock(ttl, Arc::new(Utc::now))
    }

    pub fn with_clock(ttl: std::time::Duration, clock: Clock) -> Self {
        Self {
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::MAX),
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// 未過期時回傳複本，呼叫端無法改動快取內容
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let now = (self.clock)();
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if now - entry.created_at < self.ttl => {
                debug!("Cache hit for {}/{}", key.slug, key.bracket);
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!("Cache entry for {}/{} expired", key.slug, key.bracket);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: CacheKey, value: V) {
        let created_at = (self.clock)();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, CacheEntry { created_at, value });
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
