//! # Dividend Query Service
//! Cache-aside read of a company's dividend history by exact company name.
//!
//! Probe the cache; on a miss load company + dividends from the store,
//! assemble a [`ScrapedResult`], write it back, return it. Not-found results
//! are never cached. A cache that cannot be reached fails the request with
//! `FAIL_TO_CONNECT_REDIS_SERVER` instead of being treated as a miss.

use std::sync::Arc;

use metrics::counter;
use tracing::{error, info};

use crate::cache::DividendCache;
use crate::error::{ErrorCode, ScrapError, ScrapResult};
use crate::model::ScrapedResult;
use crate::store::{CompanyStore, DividendStore};

pub struct DividendQueryService {
    companies: Arc<dyn CompanyStore>,
    dividends: Arc<dyn DividendStore>,
    cache: Arc<dyn DividendCache>,
}

impl DividendQueryService {
    pub fn new(
        companies: Arc<dyn CompanyStore>,
        dividends: Arc<dyn DividendStore>,
        cache: Arc<dyn DividendCache>,
    ) -> Self {
        Self {
            companies,
            dividends,
            cache,
        }
    }

    pub async fn get_dividends_by_company_name(&self, name: &str) -> ScrapResult<ScrapedResult> {
        let cached = self.cache.get(name).await.inspect_err(|e| {
            counter!("dividend_cache_errors_total").increment(1);
            error!(%name, backend = self.cache.name(), error = %e, "cache probe failed");
        })?;
        if let Some(hit) = cached {
            counter!("dividend_cache_hits_total").increment(1);
            return Ok(hit);
        }
        counter!("dividend_cache_misses_total").increment(1);

        info!(%name, "Getting dividend information for company");
        let company = self.companies.find_by_name(name).await?.ok_or_else(|| {
            error!(%name, "Company not found with name");
            ScrapError::new(ErrorCode::CompanyNotFound)
        })?;

        let dividends = self
            .dividends
            .find_all_by_company_id(company.id)
            .await?
            .iter()
            .map(|d| d.dividend())
            .collect();
        let result = ScrapedResult {
            company: company.company(),
            dividends,
        };

        self.cache.put(name, &result).await.inspect_err(|e| {
            counter!("dividend_cache_errors_total").increment(1);
            error!(%name, backend = self.cache.name(), error = %e, "cache populate failed");
        })?;
        info!(%name, dividends = result.dividends.len(), "Dividend information retrieved");
        Ok(result)
    }
}
