//! Cache-aside behaviour of the dividend query service.
//!
//! Covered:
//! - first read goes to the store and populates the cache, second read does not
//! - unknown company is COMPANY_NOT_FOUND and never cached
//! - unreachable cache is FAIL_TO_CONNECT_REDIS_SERVER, not a miss
//! - TTL expiry sends the next read back to the store

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use dividend_tracker::cache::{CacheError, CacheResult, DividendCache, MemoryCache};
use dividend_tracker::finance::DividendQueryService;
use dividend_tracker::model::{Company, CompanyRecord, DividendRecord, Page, ScrapedResult};
use dividend_tracker::store::{CompanyStore, DividendStore, MemoryStore, StoreResult};
use dividend_tracker::ErrorCode;

/// Store wrapper counting name lookups and dividend reads.
struct CountingStore {
    inner: MemoryStore,
    name_lookups: AtomicUsize,
    dividend_reads: AtomicUsize,
}

impl CountingStore {
    fn lookups(&self) -> (usize, usize) {
        (
            self.name_lookups.load(Ordering::SeqCst),
            self.dividend_reads.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl CompanyStore for CountingStore {
    async fn exists_by_ticker(&self, ticker: &str) -> StoreResult<bool> {
        self.inner.exists_by_ticker(ticker).await
    }

    async fn save(&self, company: &Company) -> StoreResult<CompanyRecord> {
        CompanyStore::save(&self.inner, company).await
    }

    async fn find_by_ticker(&self, ticker: &str) -> StoreResult<Option<CompanyRecord>> {
        self.inner.find_by_ticker(ticker).await
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<CompanyRecord>> {
        self.name_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_name(name).await
    }

    async fn find_by_name_starting_with_ignore_case(
        &self,
        prefix: &str,
        limit: usize,
    ) -> StoreResult<Vec<CompanyRecord>> {
        self.inner
            .find_by_name_starting_with_ignore_case(prefix, limit)
            .await
    }

    async fn find_all(&self, page: usize, size: usize) -> StoreResult<Page<CompanyRecord>> {
        self.inner.find_all(page, size).await
    }

    async fn delete(&self, company: &CompanyRecord) -> StoreResult<()> {
        self.inner.delete(company).await
    }
}

#[async_trait]
impl DividendStore for CountingStore {
    async fn save_all(&self, dividends: Vec<DividendRecord>) -> StoreResult<()> {
        self.inner.save_all(dividends).await
    }

    async fn find_all_by_company_id(&self, company_id: i64) -> StoreResult<Vec<DividendRecord>> {
        self.dividend_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.find_all_by_company_id(company_id).await
    }

    async fn delete_all_by_company_id(&self, company_id: i64) -> StoreResult<usize> {
        self.inner.delete_all_by_company_id(company_id).await
    }
}

async fn seeded_store() -> Arc<CountingStore> {
    let inner = MemoryStore::new();
    let rec = CompanyStore::save(&inner, &Company::new("KO", "Coca-Cola"))
        .await
        .unwrap();
    let rows = ["2024-03-14", "2024-06-14"]
        .iter()
        .map(|d| DividendRecord {
            company_id: rec.id,
            date: NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap(),
            amount: "0.485".parse().unwrap(),
        })
        .collect();
    inner.save_all(rows).await.unwrap();
    Arc::new(CountingStore {
        inner,
        name_lookups: AtomicUsize::new(0),
        dividend_reads: AtomicUsize::new(0),
    })
}

fn service(store: &Arc<CountingStore>, cache: Arc<dyn DividendCache>) -> DividendQueryService {
    DividendQueryService::new(store.clone(), store.clone(), cache)
}

#[tokio::test]
async fn second_read_is_served_from_cache() {
    let store = seeded_store().await;
    let cache = Arc::new(MemoryCache::new(Duration::from_secs(60), 100));
    let svc = service(&store, cache.clone());

    let first = svc.get_dividends_by_company_name("Coca-Cola").await.unwrap();
    assert_eq!(first.company, Company::new("KO", "Coca-Cola"));
    assert_eq!(first.dividends.len(), 2);
    assert_eq!(store.lookups(), (1, 1));
    assert_eq!(cache.len(), 1);

    let second = svc.get_dividends_by_company_name("Coca-Cola").await.unwrap();
    assert_eq!(second, first);
    assert_eq!(store.lookups(), (1, 1), "cache hit must not touch the store");
}

#[tokio::test]
async fn unknown_company_is_not_cached() {
    let store = seeded_store().await;
    let cache = Arc::new(MemoryCache::new(Duration::from_secs(60), 100));
    let svc = service(&store, cache.clone());

    for _ in 0..2 {
        let err = svc
            .get_dividends_by_company_name("NoSuchCompany")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CompanyNotFound);
    }
    assert!(cache.is_empty());
    assert_eq!(store.lookups(), (2, 0));
}

#[tokio::test]
async fn lookup_is_exact_on_name() {
    let store = seeded_store().await;
    let cache = Arc::new(MemoryCache::new(Duration::from_secs(60), 100));
    let svc = service(&store, cache);

    let err = svc.get_dividends_by_company_name("coca-cola").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::CompanyNotFound);
}

/// Cache whose server is never reachable.
struct DownCache;

#[async_trait]
impl DividendCache for DownCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<ScrapedResult>> {
        Err(CacheError::Connection("connection refused".into()))
    }

    async fn put(&self, _key: &str, _value: &ScrapedResult) -> CacheResult<()> {
        Err(CacheError::Connection("connection refused".into()))
    }

    fn name(&self) -> &'static str {
        "down"
    }
}

#[tokio::test]
async fn unreachable_cache_is_reported_not_treated_as_miss() {
    let store = seeded_store().await;
    let svc = service(&store, Arc::new(DownCache));

    let err = svc.get_dividends_by_company_name("Coca-Cola").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::FailToConnectRedisServer);
    assert_eq!(err.status().as_u16(), 500);
    assert_eq!(store.lookups(), (0, 0));
}

#[tokio::test]
async fn expired_entry_goes_back_to_the_store() {
    let store = seeded_store().await;
    let cache = Arc::new(MemoryCache::new(Duration::from_millis(30), 100));
    let svc = service(&store, cache);

    svc.get_dividends_by_company_name("Coca-Cola").await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;
    svc.get_dividends_by_company_name("Coca-Cola").await.unwrap();
    assert_eq!(store.lookups(), (2, 2));
}
