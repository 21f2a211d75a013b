//! Library surface shared by the binary and integration tests.

pub mod api;
pub mod bootstrap;
pub mod cache;
pub mod company;
pub mod config;
pub mod error;
pub mod finance;
pub mod index;
pub mod metrics;
pub mod model;
pub mod scrape;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::error::{ErrorCode, ScrapError, ScrapResult};

use axum::Router;
use tracing::info;

/// Build the full in-process application: config, backends, services, the
/// HTTP routes and `/metrics`.
pub async fn app() -> anyhow::Result<Router> {
    let cfg = config::AppConfig::load()?;
    // recorder first, so the startup index rebuild is reported
    let metrics = metrics::Metrics::init(cfg.cache.ttl_secs)?;
    let state = bootstrap::build_state(&cfg).await?;
    info!(
        indexed = state.companies.index().len(),
        cache = ?cfg.cache.backend,
        "dividend tracker ready"
    );
    Ok(api::router(state).merge(metrics.router()))
}
