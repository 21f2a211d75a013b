//! Explicit call policy around any provider: per-attempt timeout plus a
//! bounded number of retries for transient failures, with linear backoff.
//! Non-transient errors (unknown ticker, malformed payload) return at once.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;

use super::{ScrapeError, ScrapeProvider, ScrapeResult};
use crate::model::{Company, ScrapedResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapePolicy {
    pub timeout: Duration,
    pub retries: u32,
    pub backoff: Duration,
}

impl Default for ScrapePolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retries: 0,
            backoff: Duration::from_millis(250),
        }
    }
}

pub struct PolicyProvider<P> {
    inner: P,
    policy: ScrapePolicy,
}

impl<P: ScrapeProvider> PolicyProvider<P> {
    pub fn new(inner: P, policy: ScrapePolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> ScrapePolicy {
        self.policy
    }

    async fn run<'a, T, F, Fut>(&'a self, op: &'static str, mut call: F) -> ScrapeResult<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = ScrapeResult<T>> + Send + 'a,
        T: Send,
    {
        let timeout_ms = u64::try_from(self.policy.timeout.as_millis()).unwrap_or(u64::MAX);
        let mut attempt = 0u32;
        loop {
            let outcome = match tokio::time::timeout(self.policy.timeout, call()).await {
                Ok(res) => res,
                Err(_) => Err(ScrapeError::Timeout(timeout_ms)),
            };
            match outcome {
                Err(e) if e.is_transient() && attempt < self.policy.retries => {
                    attempt += 1;
                    counter!("scrape_retries_total").increment(1);
                    tracing::warn!(
                        provider = self.inner.name(),
                        op,
                        attempt,
                        error = %e,
                        "transient scrape failure, retrying"
                    );
                    tokio::time::sleep(self.policy.backoff * attempt).await;
                }
                other => return other,
            }
        }
    }
}

#[async_trait]
impl<P: ScrapeProvider> ScrapeProvider for PolicyProvider<P> {
    async fn resolve_by_ticker(&self, ticker: &str) -> ScrapeResult<Option<Company>> {
        self.run("resolve", || self.inner.resolve_by_ticker(ticker))
            .await
    }

    async fn fetch_history(&self, company: &Company) -> ScrapeResult<ScrapedResult> {
        self.run("history", || self.inner.fetch_history(company))
            .await
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
