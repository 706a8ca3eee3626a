use crate::domain::ports::Clock;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// Memoizes values for a fixed wall-clock window. Errors are never stored.
pub struct TtlCache<K, V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fresh value for `key`, if any. Expired entries are dropped here.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if now.duration_since(entry.stored_at) < self.ttl => {
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: K, value: V) {
        let stored_at = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, Entry { value, stored_at });
    }

    /// Returns the cached value or runs `load` and caches its success.
    ///
    /// The lock is not held across `load`, so two concurrent misses may both
    /// reach the warehouse; the later result wins.
    pub async fn get_or_try_insert<F, Fut, E>(&self, key: K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = load().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache(clock: &ManualClock) -> TtlCache<&'static str, u32> {
        TtlCache::with_clock(Duration::from_secs(60), Arc::new(clock.clone()))
    }

    #[test]
    fn test_entry_expires_at_ttl() {
        let clock = ManualClock::new();
        let cache = cache(&clock);
        cache.insert("summary", 1);

        clock.advance(Duration::from_secs(59));
        assert_eq!(cache.get(&"summary"), Some(1));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(&"summary"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_get_or_try_insert_only_loads_on_miss() {
        let clock = ManualClock::new();
        let cache = cache(&clock);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<u32, ()> = cache
                .get_or_try_insert("summary", || async {
                    Ok(calls.fetch_add(1, Ordering::SeqCst) as u32)
                })
                .await;
            assert_eq!(value, Ok(0));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(61));
        let value: Result<u32, ()> = cache
            .get_or_try_insert("summary", || async {
                Ok(calls.fetch_add(1, Ordering::SeqCst) as u32)
            })
            .await;
        assert_eq!(value, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let clock = ManualClock::new();
        let cache = cache(&clock);

        let failed: Result<u32, &str> = cache
            .get_or_try_insert("summary", || async { Err("boom") })
            .await;
        assert_eq!(failed, Err("boom"));
        assert!(cache.is_empty());

        let ok: Result<u32, &str> = cache.get_or_try_insert("summary", || async { Ok(7) }).await;
        assert_eq!(ok, Ok(7));
    }

    #[test]
    fn test_clear() {
        let clock = ManualClock::new();
        let cache = cache(&clock);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert_eq!(cache.get(&"a"), None);
    }
}
