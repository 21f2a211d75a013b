//! # Ingestion Orchestrator
//! Coordinates scrape → persist → index for saves, and store → index for deletes.
//!
//! Ordering matters and nothing here is transactional:
//! * save: existence check, resolve, fetch history, company row, dividend rows,
//!   then the name goes into the prefix index. A failed dividend write leaves
//!   the company row behind (no compensation is attempted).
//! * delete: dividends, then the company row, then the index entry. If the
//!   index step fails the store delete has already committed.
//!
//! The existence check is a fast path only. Two concurrent saves of one ticker
//! can both pass it; the store's uniqueness constraint decides and the loser
//! gets `INVALID_REQUEST`.

use std::sync::Arc;

use metrics::counter;
use tracing::{error, info, warn};

use crate::error::{ErrorCode, ScrapError, ScrapResult};
use crate::index::PrefixIndex;
use crate::model::{Company, CompanyRecord, DividendRecord, Page};
use crate::scrape::ScrapeProvider;
use crate::store::{CompanyStore, DividendStore};

pub struct CompanyService {
    companies: Arc<dyn CompanyStore>,
    dividends: Arc<dyn DividendStore>,
    scraper: Arc<dyn ScrapeProvider>,
    index: Arc<PrefixIndex>,
}

impl CompanyService {
    pub fn new(
        companies: Arc<dyn CompanyStore>,
        dividends: Arc<dyn DividendStore>,
        scraper: Arc<dyn ScrapeProvider>,
        index: Arc<PrefixIndex>,
    ) -> Self {
        Self {
            companies,
            dividends,
            scraper,
            index,
        }
    }

    pub fn index(&self) -> &Arc<PrefixIndex> {
        &self.index
    }

    /// Scrape and persist a company with its dividend history.
    pub async fn save(&self, ticker: &str) -> ScrapResult<Company> {
        info!(%ticker, "Saving company");
        if ticker.trim().is_empty() {
            return Err(ScrapError::new(ErrorCode::InvalidTicker));
        }
        if self.companies.exists_by_ticker(ticker).await? {
            warn!(%ticker, "company already saved");
            return Err(ScrapError::new(ErrorCode::CompanyAlreadySaved));
        }

        let company = self
            .scraper
            .resolve_by_ticker(ticker)
            .await
            .inspect_err(|_| {
                counter!("scrape_failures_total").increment(1);
            })?
            .ok_or_else(|| {
                warn!(%ticker, provider = self.scraper.name(), "ticker did not resolve");
                ScrapError::new(ErrorCode::CompanyNotFound)
            })?;

        let scraped = self
            .scraper
            .fetch_history(&company)
            .await
            .inspect_err(|_| {
                counter!("scrape_failures_total").increment(1);
            })?;

        let record = self.companies.save(&company).await?;
        let rows: Vec<DividendRecord> = scraped
            .dividends
            .iter()
            .map(|d| DividendRecord::bind(record.id, d))
            .collect();
        let count = rows.len();
        self.dividends.save_all(rows).await.inspect_err(|e| {
            error!(%ticker, company_id = record.id, error = %e, "dividend write failed; company row kept");
        })?;

        self.index.add(&record.name)?;
        counter!("company_saved_total").increment(1);
        info!(%ticker, name = %record.name, dividends = count, "Company saved");
        Ok(record.company())
    }

    /// Delete a company, its dividends and its index entry. Returns the name.
    pub async fn delete_company(&self, ticker: &str) -> ScrapResult<String> {
        info!(%ticker, "Deleting company");
        let company = self
            .companies
            .find_by_ticker(ticker)
            .await?
            .ok_or_else(|| ScrapError::new(ErrorCode::CompanyNotFound))?;

        let removed = self.dividends.delete_all_by_company_id(company.id).await?;
        self.companies.delete(&company).await?;
        self.remove_autocomplete_keyword(&company.name);

        counter!("company_deleted_total").increment(1);
        info!(%ticker, name = %company.name, dividends = removed, "Company deleted");
        Ok(company.name)
    }

    pub async fn list_companies(&self, page: usize, size: usize) -> ScrapResult<Page<CompanyRecord>> {
        info!(page, size, "Getting all companies");
        Ok(self.companies.find_all(page, size).await?)
    }

    /// Store-backed, case-insensitive name suggestions.
    pub async fn company_names_by_keyword(
        &self,
        keyword: &str,
        limit: usize,
    ) -> ScrapResult<Vec<String>> {
        info!(%keyword, "Getting company names by keyword");
        let rows = self
            .companies
            .find_by_name_starting_with_ignore_case(keyword, limit)
            .await?;
        Ok(rows.into_iter().map(|c| c.name).collect())
    }

    pub fn add_autocomplete_keyword(&self, name: &str) -> ScrapResult<()> {
        self.index.add(name)?;
        Ok(())
    }

    pub fn remove_autocomplete_keyword(&self, name: &str) {
        self.index.remove(name);
    }

    /// Index-backed autocomplete, truncated to `limit`.
    pub fn autocomplete(&self, prefix: &str, limit: usize) -> Vec<String> {
        let mut names = self.index.prefix_search(prefix);
        names.truncate(limit);
        names
    }

    /// Rebuild the prefix index from every stored company. Returns the number
    /// of names indexed.
    pub async fn rebuild_index(&self) -> ScrapResult<usize> {
        const PAGE: usize = 500;
        let mut names = Vec::new();
        let mut page = 0usize;
        loop {
            let batch = self.companies.find_all(page, PAGE).await?;
            let n = batch.content.len();
            names.extend(batch.content.into_iter().map(|c| c.name));
            if n < PAGE {
                break;
            }
            page += 1;
        }
        let skipped = self.index.replace_all(&names);
        if skipped > 0 {
            warn!(skipped, "prefix index bound reached during rebuild");
        }
        let indexed = self.index.len();
        info!(indexed, "Prefix index rebuilt");
        Ok(indexed)
    }
}
