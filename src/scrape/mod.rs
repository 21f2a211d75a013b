//! Scrape provider port.
//!
//! A provider turns a ticker into a company identity and, in a second and
//! possibly slow call, into that company's full dividend history. Parsing of
//! the upstream source happens behind this boundary; callers only see
//! structured results or a [`ScrapeError`].

pub mod fixture;
pub mod http;
pub mod policy;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Company, ScrapedResult};

pub use fixture::FixtureScrapeProvider;
pub use http::HttpScrapeProvider;
pub use policy::{PolicyProvider, ScrapePolicy};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScrapeError {
    /// The provider has no data for this ticker.
    #[error("unknown ticker '{0}'")]
    UnknownTicker(String),
    #[error("provider timed out after {0} ms")]
    Timeout(u64),
    #[error("provider transport error: {0}")]
    Transport(String),
    #[error("provider returned status {0}")]
    Upstream(u16),
    #[error("provider payload malformed: {0}")]
    Malformed(String),
}

impl ScrapeError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ScrapeError::Timeout(_) | ScrapeError::Transport(_) => true,
            ScrapeError::Upstream(status) => *status >= 500 || *status == 429,
            ScrapeError::UnknownTicker(_) | ScrapeError::Malformed(_) => false,
        }
    }
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;

#[async_trait]
pub trait ScrapeProvider: Send + Sync {
    /// `Ok(None)` when the ticker does not resolve to a company.
    async fn resolve_by_ticker(&self, ticker: &str) -> ScrapeResult<Option<Company>>;

    async fn fetch_history(&self, company: &Company) -> ScrapeResult<ScrapedResult>;

    fn name(&self) -> &'static str;
}
