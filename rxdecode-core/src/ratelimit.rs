use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const UPLOAD_FEATURE: &str = "upload";
pub const SEARCH_FEATURE: &str = "search";

pub const UPLOAD_LIMIT: u32 = 5;
pub const SEARCH_LIMIT: u32 = 10;

/// Fixed reset window for every feature counter.
const WINDOW_MS: i64 = 60_000;

/// Persisted counter for one feature, JSON-encoded in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitRecord {
    pub count: u32,
    pub reset_time: i64,
}

/// Millisecond clock, injected so tests can simulate time passage.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Key/value backing for rate-limit records. Values are JSON-encoded
/// [`RateLimitRecord`]s; a record that fails to decode is treated as absent
/// and replaced on the next check.
pub trait RateLimitStore: Send + Sync {
    fn load(&self, key: &str) -> Option<String>;
    fn store(&self, key: &str, value: String);
}

pub struct InMemoryRateLimitStore {
    entries: DashMap<String, String>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl Default for InMemoryRateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn load(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.clone())
    }

    fn store(&self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }
}

/// Fixed-window counter per feature key. The count only increments while
/// the window is open; once `now` reaches the reset time the record is
/// replaced with a fresh `{count: 1}` window.
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>, store: Arc<dyn RateLimitStore>) -> Self {
        Self { clock, store }
    }

    /// System clock with in-memory storage.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(InMemoryRateLimitStore::new()))
    }

    /// Check and consume one slot for `feature`. Returns false when the
    /// window is open and already at `limit`; a denied check mutates
    /// nothing.
    pub fn check(&self, feature: &str, limit: u32) -> bool {
        let now = self.clock.now_ms();

        if let Some(raw) = self.store.load(feature) {
            if let Ok(record) = serde_json::from_str::<RateLimitRecord>(&raw) {
                if now < record.reset_time {
                    if record.count >= limit {
                        debug!(feature, count = record.count, "rate limit reached");
                        return false;
                    }
                    self.write(feature, record.count + 1, record.reset_time);
                    return true;
                }
            }
        }

        // No record, undecodable record, or expired window: start fresh.
        self.write(feature, 1, now + WINDOW_MS);
        true
    }

    fn write(&self, feature: &str, count: u32, reset_time: i64) {
        let record = RateLimitRecord { count, reset_time };
        match serde_json::to_string(&record) {
            Ok(raw) => self.store.store(feature, raw),
            Err(e) => debug!(feature, "failed to encode rate limit record: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct ManualClock {
        now: AtomicI64,
    }

    impl ManualClock {
        fn new(start: i64) -> Self {
            Self {
                now: AtomicI64::new(start),
            }
        }

        fn advance(&self, ms: i64) {
            self.now.fetch_add(ms, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> i64 {
            self.now.load(Ordering::SeqCst)
        }
    }

    fn limiter_at(start: i64) -> (Arc<ManualClock>, RateLimiter) {
        let clock = Arc::new(ManualClock::new(start));
        let limiter = RateLimiter::new(clock.clone(), Arc::new(InMemoryRateLimitStore::new()));
        (clock, limiter)
    }

    #[test]
    fn allows_up_to_limit_then_blocks() {
        let (_clock, limiter) = limiter_at(1_000);

        for _ in 0..SEARCH_LIMIT {
            assert!(limiter.check(SEARCH_FEATURE, SEARCH_LIMIT));
        }
        assert!(!limiter.check(SEARCH_FEATURE, SEARCH_LIMIT));
        assert!(!limiter.check(SEARCH_FEATURE, SEARCH_LIMIT));
    }

    #[test]
    fn window_elapse_resets_counter_to_one() {
        let (clock, limiter) = limiter_at(1_000);

        for _ in 0..SEARCH_LIMIT {
            assert!(limiter.check(SEARCH_FEATURE, SEARCH_LIMIT));
        }
        assert!(!limiter.check(SEARCH_FEATURE, SEARCH_LIMIT));

        clock.advance(WINDOW_MS);
        assert!(limiter.check(SEARCH_FEATURE, SEARCH_LIMIT));

        // Fresh window: the full quota minus the one just consumed remains.
        for _ in 1..SEARCH_LIMIT {
            assert!(limiter.check(SEARCH_FEATURE, SEARCH_LIMIT));
        }
        assert!(!limiter.check(SEARCH_FEATURE, SEARCH_LIMIT));
    }

    #[test]
    fn features_are_counted_independently() {
        let (_clock, limiter) = limiter_at(1_000);

        for _ in 0..UPLOAD_LIMIT {
            assert!(limiter.check(UPLOAD_FEATURE, UPLOAD_LIMIT));
        }
        assert!(!limiter.check(UPLOAD_FEATURE, UPLOAD_LIMIT));
        assert!(limiter.check(SEARCH_FEATURE, SEARCH_LIMIT));
    }

    #[test]
    fn denied_check_does_not_mutate_the_record() {
        let clock = Arc::new(ManualClock::new(1_000));
        let store = Arc::new(InMemoryRateLimitStore::new());
        let limiter = RateLimiter::new(clock.clone(), store.clone());

        for _ in 0..UPLOAD_LIMIT {
            limiter.check(UPLOAD_FEATURE, UPLOAD_LIMIT);
        }
        let before = store.load(UPLOAD_FEATURE);
        assert!(!limiter.check(UPLOAD_FEATURE, UPLOAD_LIMIT));
        assert_eq!(store.load(UPLOAD_FEATURE), before);
    }

    #[test]
    fn undecodable_record_is_replaced() {
        let clock = Arc::new(ManualClock::new(1_000));
        let store = Arc::new(InMemoryRateLimitStore::new());
        store.store(UPLOAD_FEATURE, "not json".to_string());
        let limiter = RateLimiter::new(clock, store.clone());

        assert!(limiter.check(UPLOAD_FEATURE, UPLOAD_LIMIT));
        let record: RateLimitRecord =
            serde_json::from_str(&store.load(UPLOAD_FEATURE).unwrap()).unwrap();
        assert_eq!(record.count, 1);
        assert_eq!(record.reset_time, 1_000 + WINDOW_MS);
    }

    #[test]
    fn record_round_trips_with_camel_case_key() {
        let raw = serde_json::to_string(&RateLimitRecord {
            count: 3,
            reset_time: 99,
        })
        .unwrap();
        assert!(raw.contains("resetTime"));
    }
}
