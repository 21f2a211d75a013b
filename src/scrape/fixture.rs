//! Fixture-backed provider for local runs and tests.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{ScrapeError, ScrapeProvider, ScrapeResult};
use crate::model::{Company, ScrapedResult};

/// Provider serving pre-scraped results from a JSON document keyed by ticker:
/// `{ "MMM": { "company": {...}, "dividends": [...] }, ... }`.
/// Used for local runs and tests; no network.
#[derive(Debug, Clone, Default)]
pub struct FixtureScrapeProvider {
    results: HashMap<String, ScrapedResult>,
}

impl FixtureScrapeProvider {
    pub fn from_fixture(content: &str) -> Result<Self> {
        let results: HashMap<String, ScrapedResult> =
            serde_json::from_str(content).context("parsing scrape fixtures")?;
        Ok(Self { results })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading scrape fixtures from {}", path.display()))?;
        Self::from_fixture(&content)
    }

    pub fn from_results(results: impl IntoIterator<Item = ScrapedResult>) -> Self {
        Self {
            results: results
                .into_iter()
                .map(|r| (r.company.ticker.clone(), r))
                .collect(),
        }
    }

    pub fn tickers(&self) -> Vec<&str> {
        let mut v: Vec<&str> = self.results.keys().map(String::as_str).collect();
        v.sort_unstable();
        v
    }
}

#[async_trait]
impl ScrapeProvider for FixtureScrapeProvider {
    async fn resolve_by_ticker(&self, ticker: &str) -> ScrapeResult<Option<Company>> {
        Ok(self.results.get(ticker).map(|r| r.company.clone()))
    }

    async fn fetch_history(&self, company: &Company) -> ScrapeResult<ScrapedResult> {
        self.results
            .get(&company.ticker)
            .cloned()
            .ok_or_else(|| ScrapeError::UnknownTicker(company.ticker.clone()))
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
