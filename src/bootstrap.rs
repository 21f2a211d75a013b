//! Wires concrete backends into the services according to [`AppConfig`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::api::AppState;
use crate::cache::{DividendCache, MemoryCache, RedisCache};
use crate::company::CompanyService;
use crate::config::{AppConfig, CacheBackend};
use crate::finance::DividendQueryService;
use crate::index::PrefixIndex;
use crate::scrape::{FixtureScrapeProvider, HttpScrapeProvider, PolicyProvider, ScrapeProvider};
use crate::store::MemoryStore;

pub fn build_store(cfg: &AppConfig) -> Result<Arc<MemoryStore>> {
    let store = match &cfg.store.snapshot_path {
        Some(p) => MemoryStore::with_snapshot(p)?,
        None => MemoryStore::new(),
    };
    Ok(Arc::new(store))
}

pub async fn build_cache(cfg: &AppConfig) -> Result<Arc<dyn DividendCache>> {
    let c = &cfg.cache;
    let cache: Arc<dyn DividendCache> = match c.backend {
        CacheBackend::Memory => Arc::new(MemoryCache::new(
            Duration::from_secs(c.ttl_secs),
            c.max_entries,
        )),
        CacheBackend::Redis => Arc::new(
            RedisCache::connect(&c.redis_url, c.ttl_secs, &c.key_prefix)
                .await
                .context("connecting redis cache")?,
        ),
    };
    info!(backend = cache.name(), ttl_secs = c.ttl_secs, "dividend cache ready");
    Ok(cache)
}

pub fn build_scraper(cfg: &AppConfig) -> Result<Arc<dyn ScrapeProvider>> {
    let s = &cfg.scrape;
    let policy = s.policy();
    if let Some(url) = &s.base_url {
        info!(%url, timeout_ms = s.timeout_ms, retries = s.retries, "http scrape provider");
        let http = HttpScrapeProvider::new(url, policy.timeout)?;
        return Ok(Arc::new(PolicyProvider::new(http, policy)));
    }
    let fixtures = match &s.fixtures_path {
        Some(p) => FixtureScrapeProvider::from_path(p)?,
        None => {
            warn!("no scrape provider configured; every ticker will resolve to nothing");
            FixtureScrapeProvider::default()
        }
    };
    info!(tickers = fixtures.tickers().len(), "fixture scrape provider");
    Ok(Arc::new(PolicyProvider::new(fixtures, policy)))
}

/// Build services from config and rebuild the prefix index from the store.
pub async fn build_state(cfg: &AppConfig) -> Result<AppState> {
    let store = build_store(cfg)?;
    let cache = build_cache(cfg).await?;
    let scraper = build_scraper(cfg)?;
    let index = Arc::new(match cfg.index.max_entries {
        Some(max) => PrefixIndex::bounded(max),
        None => PrefixIndex::new(),
    });

    let companies = Arc::new(CompanyService::new(
        store.clone(),
        store.clone(),
        scraper,
        index,
    ));
    let finance = Arc::new(DividendQueryService::new(store.clone(), store, cache));

    companies
        .rebuild_index()
        .await
        .map_err(|e| anyhow::anyhow!("initial prefix index build failed: {e}"))?;

    Ok(AppState {
        companies,
        finance,
        api: cfg.api.clone(),
    })
}
