// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use crate::domain::models::product::Product;
    use crate::domain::services::product_search_service::ProductSearchService;
    use crate::engines::classifier::Verdict;
    use crate::engines::router::EngineRouter;
    use crate::engines::traits::{EngineError, FetchOutcome, ProductFetcher};
    use crate::infrastructure::cache::cache_manager::CacheHandle;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// 计数并返回固定结果的引擎
    struct CountingFetcher {
        outcome: fn() -> Result<FetchOutcome, EngineError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProductFetcher for CountingFetcher {
        async fn fetch(&self, _query: &str, _num_results: usize) -> Result<FetchOutcome, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()
        }

        fn hard_timeout(&self) -> Duration {
            Duration::from_secs(5)
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn service(
        outcome: fn() -> Result<FetchOutcome, EngineError>,
        cache: CacheHandle,
    ) -> (ProductSearchService, Arc<CountingFetcher>) {
        let fetcher = Arc::new(CountingFetcher {
            outcome,
            calls: AtomicUsize::new(0),
        });
        let router = EngineRouter::new(vec![fetcher.clone() as Arc<dyn ProductFetcher>]);
        let service = ProductSearchService::new(
            Arc::new(router),
            cache,
            "myntra",
            Duration::from_secs(3600),
            2,
        );
        (service, fetcher)
    }

    fn tee() -> Product {
        Product::new("Cotton Tee", "https://assets.myntassets.com/tee.jpg")
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let cache = CacheHandle::memory();
        let (service, fetcher) = service(
            || Ok(FetchOutcome::Extracted(vec![tee()])),
            cache.clone(),
        );

        let first = service.find_products("White T-shirt for men").await;
        let second = service.find_products("White T-shirt for men").await;

        assert_eq!(first, vec![tee()]);
        assert_eq!(second, first);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            cache.get("myntra:White T-shirt for men").await,
            Some(vec![tee()])
        );
    }

    #[tokio::test]
    async fn test_cached_empty_list_short_circuits() {
        let cache = CacheHandle::memory();
        let (service, fetcher) = service(|| Ok(FetchOutcome::Extracted(Vec::new())), cache.clone());

        assert!(service.find_products("Red Scarf for women").await.is_empty());
        assert!(service.find_products("Red Scarf for women").await.is_empty());

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get("myntra:Red Scarf for women").await, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_transport_errors_are_never_cached() {
        let cache = CacheHandle::memory();
        let (service, fetcher) = service(|| Err(EngineError::Timeout), cache.clone());

        assert!(service.find_products("Blue Jeans for men").await.is_empty());
        assert!(service.find_products("Blue Jeans for men").await.is_empty());

        // 每次都重新抓取
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.get("myntra:Blue Jeans for men").await, None);
    }

    #[tokio::test]
    async fn test_block_pages_are_never_cached() {
        let cache = CacheHandle::memory();
        let (service, _) = service(|| Ok(FetchOutcome::Rejected(Verdict::Blocked)), cache.clone());

        assert!(service.find_products("Blue Jeans for men").await.is_empty());
        assert_eq!(cache.get("myntra:Blue Jeans for men").await, None);
    }

    #[tokio::test]
    async fn test_pre_populated_cache_skips_engines() {
        let cache = CacheHandle::memory();
        cache
            .set("myntra:Black Jeans for men", &[tee()], Duration::from_secs(60))
            .await;
        let (service, fetcher) = service(|| Err(EngineError::Timeout), cache);

        assert_eq!(service.find_products("Black Jeans for men").await, vec![tee()]);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_fetches() {
        let (service, fetcher) = service(
            || Ok(FetchOutcome::Extracted(vec![tee()])),
            CacheHandle::Disabled,
        );

        service.find_products("White T-shirt for men").await;
        service.find_products("White T-shirt for men").await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }
}
