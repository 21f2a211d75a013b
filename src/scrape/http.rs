//! HTTP provider for a scraping sidecar.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::{ScrapeError, ScrapeProvider, ScrapeResult};
use crate::model::{Company, ScrapedResult};

/// Talks to a scraping sidecar that already returns structured JSON:
///
/// * `GET {base}/companies/{ticker}` → `Company`, or 404 when unknown
/// * `GET {base}/companies/{ticker}/dividends` → `ScrapedResult`
pub struct HttpScrapeProvider {
    http: reqwest::Client,
    base_url: String,
    timeout_ms: u64,
}

impl HttpScrapeProvider {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("dividend-tracker/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(timeout.min(Duration::from_secs(4)))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }

    fn company_url(&self, ticker: &str) -> String {
        format!("{}/companies/{}", self.base_url, encode_segment(ticker))
    }

    async fn get(&self, url: &str) -> ScrapeResult<reqwest::Response> {
        self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ScrapeError::Timeout(self.timeout_ms)
            } else {
                ScrapeError::Transport(e.to_string())
            }
        })
    }
}

/// Percent-encodes everything outside the unreserved set so tickers such as
/// `BRK/B` or `^DJI` stay a single path segment.
fn encode_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

#[async_trait]
impl ScrapeProvider for HttpScrapeProvider {
    async fn resolve_by_ticker(&self, ticker: &str) -> ScrapeResult<Option<Company>> {
        let resp = self.get(&self.company_url(ticker)).await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let company: Company = resp
                    .json()
                    .await
                    .map_err(|e| ScrapeError::Malformed(e.to_string()))?;
                Ok(Some(company))
            }
            s => Err(ScrapeError::Upstream(s.as_u16())),
        }
    }

    async fn fetch_history(&self, company: &Company) -> ScrapeResult<ScrapedResult> {
        let url = format!("{}/dividends", self.company_url(&company.ticker));
        let resp = self.get(&url).await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Err(ScrapeError::UnknownTicker(company.ticker.clone())),
            s if s.is_success() => resp
                .json::<ScrapedResult>()
                .await
                .map_err(|e| ScrapeError::Malformed(e.to_string())),
            s => Err(ScrapeError::Upstream(s.as_u16())),
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
