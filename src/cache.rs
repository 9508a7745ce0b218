//! Bounded TTL cache for finished call results, keyed by call signature.
//!
//! Entries expire a fixed `max_age` after insertion and are purged lazily when a
//! lookup finds them stale. The bound is enforced first-in-first-out, regardless
//! of how much life an entry has left.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::{Result, DEFAULT_CACHE_MAX_AGE, DEFAULT_CACHE_MAX_ENTRIES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    pub max_age: Duration,
    /// 0 means unbounded.
    pub max_entries: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_CACHE_MAX_AGE,
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
    seq: u64,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Insertion sequence to key, oldest first.
    order: BTreeMap<u64, String>,
    next_seq: u64,
}

#[derive(Debug)]
pub struct ResponseCache {
    options: CacheOptions,
    inner: Mutex<CacheInner>,
}

impl ResponseCache {
    pub fn new(options: CacheOptions) -> Self {
        Self {
            options,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// `"<method>:<json of options>"`. Options must already have their defaults applied,
    /// so that an explicit default and an omitted one share an entry.
    pub fn key(method: &str, options: &impl Serialize) -> Result<String> {
        Ok(format!("{method}:{}", serde_json::to_string(options)?))
    }

    fn inner(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut inner = self.inner();
        let entry = inner.entries.get(key)?;
        if Instant::now() < entry.expires_at {
            return Some(entry.value.clone());
        }
        let seq = entry.seq;
        inner.entries.remove(key);
        inner.order.remove(&seq);
        debug!(key, "cache entry expired");
        None
    }

    pub fn insert(&self, key: String, value: Vec<u8>) {
        let expires_at = Instant::now() + self.options.max_age;
        let mut inner = self.inner();

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.order.insert(seq, key.clone());
        if let Some(replaced) = inner.entries.insert(key, CacheEntry { value, expires_at, seq }) {
            inner.order.remove(&replaced.seq);
        }

        let max = self.options.max_entries;
        while max > 0 && inner.entries.len() > max {
            let Some((_, oldest)) = inner.order.pop_first() else {
                break;
            };
            inner.entries.remove(&oldest);
            debug!(key = %oldest, "cache entry evicted");
        }
    }

    pub fn len(&self) -> usize {
        self.inner().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// A stored value that no longer deserializes counts as a miss.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.get(key)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "discarding undecodable cache entry");
                None
            }
        }
    }

    pub fn insert_json<T: Serialize>(&self, key: String, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.insert(key, bytes),
            Err(e) => warn!(key = %key, error = %e, "result not cached"),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    fn cache(max_age: Duration, max_entries: usize) -> ResponseCache {
        ResponseCache::new(CacheOptions {
            max_age,
            max_entries,
        })
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Opts {
        app_id: &'static str,
        lang: &'static str,
    }

    #[test]
    fn key_is_method_and_canonical_json() {
        let key = ResponseCache::key("app", &Opts { app_id: "com.example", lang: "en" }).unwrap();
        assert_eq!(key, r#"app:{"appId":"com.example","lang":"en"}"#);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_max_age() {
        let cache = cache(Duration::from_secs(60), 10);
        cache.insert("k".into(), b"v".to_vec());

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get("k"), Some(b"v".to_vec()));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn evicts_earliest_inserted_first() {
        let cache = cache(Duration::from_secs(60), 3);
        for key in ["a", "b", "c", "d"] {
            cache.insert(key.into(), key.as_bytes().to_vec());
        }

        assert_eq!(cache.len(), 3);
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("d"));
    }

    #[tokio::test(start_paused = true)]
    async fn reinsert_moves_key_to_the_back() {
        let cache = cache(Duration::from_secs(60), 2);
        cache.insert("a".into(), b"1".to_vec());
        cache.insert("b".into(), b"2".to_vec());
        cache.insert("a".into(), b"3".to_vec());
        cache.insert("c".into(), b"4".to_vec());

        assert_eq!(cache.get("a"), Some(b"3".to_vec()));
        assert!(!cache.contains("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn order_stays_in_step_with_entries() {
        let cache = cache(Duration::from_secs(60), 2);
        cache.insert("a".into(), b"1".to_vec());
        cache.insert("a".into(), b"2".to_vec());
        cache.insert("b".into(), b"3".to_vec());
        assert_eq!(cache.inner().order.len(), 2);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.inner().order.values().collect::<Vec<_>>(), ["b"]);

        cache.insert("c".into(), b"4".to_vec());
        cache.insert("d".into(), b"5".to_vec());
        assert_eq!(cache.len(), 2);
        assert!(cache.contains("c") && cache.contains("d"));
        assert_eq!(cache.inner().order.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn json_helpers_round_trip_and_treat_garbage_as_miss() {
        let cache = cache(Duration::from_secs(60), 0);
        cache.insert_json("list".into(), &vec!["x".to_string(), "y".to_string()]);
        assert_eq!(
            cache.get_json::<Vec<String>>("list"),
            Some(vec!["x".to_string(), "y".to_string()])
        );

        cache.insert("bad".into(), b"not json".to_vec());
        assert_eq!(cache.get_json::<Vec<String>>("bad"), None);
    }
}
