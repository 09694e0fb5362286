//! Best-effort in-flight request deduplication.
//!
//! Collapses concurrent duplicate verification calls (same gateway payment
//! id) into one winner per TTL window. This is an in-process convenience,
//! not a distributed lock: the UNIQUE constraint on the stored gateway
//! payment id is the real duplicate-entitlement guard.
//!
//! Constructed once at startup with an injected TTL and capacity, and
//! carried in `AppState`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct DedupCache {
    entries: Mutex<HashMap<String, Instant>>,
    ttl: Duration,
    capacity: usize,
}

/// Clears the claimed key when the operation finishes (either way), so a
/// later legitimate retry is not blocked for the full TTL.
pub struct DedupGuard<'a> {
    cache: &'a DedupCache,
    key: String,
}

impl Drop for DedupGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut entries) = self.cache.entries.lock() {
            entries.remove(&self.key);
        }
    }
}

impl DedupCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    /// Claim a logical operation. Returns None if the same key is already
    /// in flight and its claim has not expired.
    pub fn begin(&self, key: &str) -> Option<DedupGuard<'_>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        entries.retain(|_, started| now.duration_since(*started) < self.ttl);

        if entries.contains_key(key) {
            return None;
        }

        // Bounded: refuse nothing, but shed the oldest claim when full.
        if entries.len() >= self.capacity {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, started)| **started)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }

        entries.insert(key.to_string(), now);
        Some(DedupGuard {
            cache: self,
            key: key.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_is_rejected_while_in_flight() {
        let cache = DedupCache::new(Duration::from_secs(30), 16);
        let guard = cache.begin("pay_abc").expect("first claim succeeds");
        assert!(cache.begin("pay_abc").is_none());
        assert!(cache.begin("pay_other").is_some());
        drop(guard);
        assert!(cache.begin("pay_abc").is_some());
    }

    #[test]
    fn expired_claims_are_reclaimed() {
        let cache = DedupCache::new(Duration::from_millis(10), 16);
        let guard = cache.begin("pay_abc").expect("first claim succeeds");
        std::mem::forget(guard); // simulate a claim never released
        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.begin("pay_abc").is_some());
    }

    #[test]
    fn capacity_sheds_oldest() {
        let cache = DedupCache::new(Duration::from_secs(30), 2);
        std::mem::forget(cache.begin("a").unwrap());
        std::mem::forget(cache.begin("b").unwrap());
        std::mem::forget(cache.begin("c").unwrap());
        let entries = cache.entries.lock().unwrap();
        assert_eq!(entries.len(), 2);
    }
}
