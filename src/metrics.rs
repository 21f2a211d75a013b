//! Prometheus exposition for the process-wide `metrics` recorder.

use anyhow::Result;
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "dividend_cache_hits_total",
            "Dividend reads served from the cache."
        );
        describe_counter!(
            "dividend_cache_misses_total",
            "Dividend reads that went to the store."
        );
        describe_counter!(
            "dividend_cache_errors_total",
            "Cache probe/populate failures."
        );
        describe_counter!("company_saved_total", "Companies scraped and persisted.");
        describe_counter!("company_deleted_total", "Companies deleted.");
        describe_counter!(
            "scrape_failures_total",
            "Scrape provider calls that returned an error."
        );
        describe_counter!("scrape_retries_total", "Scrape attempts retried.");
        describe_gauge!("prefix_index_entries", "Names held by the prefix index.");
        describe_gauge!("dividend_cache_ttl_secs", "Configured cache entry TTL.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder (once per process) and publish the
    /// configured cache TTL as a static gauge.
    pub fn init(cache_ttl_secs: u64) -> Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| PrometheusBuilder::new().install_recorder())?
            .clone();
        ensure_metrics_described();
        gauge!("dividend_cache_ttl_secs").set(cache_ttl_secs as f64);
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
