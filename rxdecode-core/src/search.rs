use std::sync::Arc;

use tracing::info;

use crate::info::InfoFetcher;
use crate::models::MedicineInfo;
use crate::ratelimit::{RateLimiter, SEARCH_FEATURE, SEARCH_LIMIT};

/// User-visible outcome of one search invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Validation notice: the query was empty after trimming.
    EmptyQuery,
    RateLimited,
    Found(MedicineInfo),
}

/// Single-stage variant of the upload pipeline: rate-limit check, then one
/// info lookup on the user-typed query. The lookup itself never fails, so
/// a search always yields a best-effort record once admitted.
pub struct SearchProcessor {
    info: Arc<dyn InfoFetcher>,
    limiter: Arc<RateLimiter>,
}

impl SearchProcessor {
    pub fn new(info: Arc<dyn InfoFetcher>, limiter: Arc<RateLimiter>) -> Self {
        Self { info, limiter }
    }

    pub async fn search(&self, query: &str) -> SearchOutcome {
        let query = query.trim();
        if query.is_empty() {
            return SearchOutcome::EmptyQuery;
        }

        if !self.limiter.check(SEARCH_FEATURE, SEARCH_LIMIT) {
            info!("search rate limit reached");
            return SearchOutcome::RateLimited;
        }

        let result = self.info.fetch_info(query).await;
        info!(medicine = %result.name, "search completed");
        SearchOutcome::Found(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::{Clock, InMemoryRateLimitStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct EchoFetcher;

    #[async_trait]
    impl InfoFetcher for EchoFetcher {
        async fn fetch_info(&self, name: &str) -> MedicineInfo {
            MedicineInfo {
                name: name.to_string(),
                usage: "usage".to_string(),
                dosage: "dosage".to_string(),
                side_effects: "side effects".to_string(),
                precautions: "precautions".to_string(),
            }
        }
    }

    struct ManualClock(AtomicI64);

    impl Clock for ManualClock {
        fn now_ms(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn processor() -> SearchProcessor {
        let limiter = RateLimiter::new(
            Arc::new(ManualClock(AtomicI64::new(0))),
            Arc::new(InMemoryRateLimitStore::new()),
        );
        SearchProcessor::new(Arc::new(EchoFetcher), Arc::new(limiter))
    }

    #[tokio::test]
    async fn empty_query_is_a_validation_notice() {
        let proc = processor();
        assert_eq!(proc.search("").await, SearchOutcome::EmptyQuery);
        assert_eq!(proc.search("   \t").await, SearchOutcome::EmptyQuery);
    }

    #[tokio::test]
    async fn query_is_trimmed_before_lookup() {
        let proc = processor();
        match proc.search("  Paracetamol  ").await {
            SearchOutcome::Found(info) => assert_eq!(info.name, "Paracetamol"),
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn eleventh_search_in_window_is_rate_limited() {
        let proc = processor();
        for _ in 0..SEARCH_LIMIT {
            assert_ne!(proc.search("Paracetamol").await, SearchOutcome::RateLimited);
        }
        assert_eq!(proc.search("Paracetamol").await, SearchOutcome::RateLimited);
    }

    #[tokio::test]
    async fn rejected_query_does_not_consume_quota() {
        let proc = processor();
        for _ in 0..SEARCH_LIMIT {
            proc.search("").await;
        }
        assert_ne!(proc.search("Paracetamol").await, SearchOutcome::RateLimited);
    }
}
