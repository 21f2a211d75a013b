//! Persistence ports for companies and their dividends.
//!
//! The orchestrator and the query service only see these traits; the concrete
//! backend is picked at bootstrap. Implementations must enforce ticker
//! uniqueness themselves and report a conflicting insert as
//! [`StoreError::Integrity`], which callers treat as a recoverable request error.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Company, CompanyRecord, DividendRecord, Page};

pub use memory::MemoryStore;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Constraint violation (e.g. two concurrent saves of one ticker).
    #[error("integrity violation: {0}")]
    Integrity(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn exists_by_ticker(&self, ticker: &str) -> StoreResult<bool>;

    /// Insert a company and return it with its generated id.
    async fn save(&self, company: &Company) -> StoreResult<CompanyRecord>;

    async fn find_by_ticker(&self, ticker: &str) -> StoreResult<Option<CompanyRecord>>;

    /// Exact, case-sensitive name lookup.
    async fn find_by_name(&self, name: &str) -> StoreResult<Option<CompanyRecord>>;

    /// Companies whose name starts with `prefix`, ignoring case, ordered by name.
    async fn find_by_name_starting_with_ignore_case(
        &self,
        prefix: &str,
        limit: usize,
    ) -> StoreResult<Vec<CompanyRecord>>;

    /// Zero-based page in insertion (id) order.
    async fn find_all(&self, page: usize, size: usize) -> StoreResult<Page<CompanyRecord>>;

    async fn delete(&self, company: &CompanyRecord) -> StoreResult<()>;
}

#[async_trait]
pub trait DividendStore: Send + Sync {
    async fn save_all(&self, dividends: Vec<DividendRecord>) -> StoreResult<()>;

    /// Dividends of one company in storage order.
    async fn find_all_by_company_id(&self, company_id: i64) -> StoreResult<Vec<DividendRecord>>;

    /// Returns the number of rows removed.
    async fn delete_all_by_company_id(&self, company_id: i64) -> StoreResult<usize>;
}
