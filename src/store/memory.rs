//! In-process store with optional JSON snapshot on disk.
//!
//! One async mutex guards both tables, so the ticker uniqueness check and the
//! insert are a single critical section. Foreign-key style ownership is
//! enforced too: dividends must reference an existing company and a company
//! cannot be deleted while it still owns dividends.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;

use super::{CompanyStore, DividendStore, StoreError, StoreResult};
use crate::model::{Company, CompanyRecord, DividendRecord, Page};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Tables {
    next_company_id: i64,
    companies: Vec<CompanyRecord>,
    dividends: Vec<DividendRecord>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
    snapshot: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store backed by a JSON snapshot file. An existing snapshot is loaded;
    /// a missing one starts empty and is created on the first write.
    pub fn with_snapshot<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let tables = match std::fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str(&s)
                .with_context(|| format!("parsing store snapshot {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Tables::default(),
            Err(e) => {
                return Err(e).with_context(|| format!("reading store snapshot {}", path.display()))
            }
        };
        tracing::info!(
            path = %path.display(),
            companies = tables.companies.len(),
            dividends = tables.dividends.len(),
            "store snapshot loaded"
        );
        Ok(Self {
            inner: Mutex::new(tables),
            snapshot: Some(path),
        })
    }

    async fn persist(&self, tables: &Tables) -> StoreResult<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        let json = serde_json::to_vec_pretty(tables).map_err(unavailable)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await.map_err(unavailable)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await.map_err(unavailable)?;
        fs::rename(&tmp, path).await.map_err(unavailable)?;
        Ok(())
    }

    /// Apply `change` so that memory only moves forward once the snapshot
    /// write has succeeded. Without a snapshot the tables are edited in place.
    async fn commit<R, F>(&self, tables: &mut Tables, change: F) -> StoreResult<R>
    where
        F: FnOnce(&mut Tables) -> R + Send,
        R: Send,
    {
        if self.snapshot.is_none() {
            return Ok(change(tables));
        }
        let mut next = tables.clone();
        let out = change(&mut next);
        self.persist(&next).await?;
        *tables = next;
        Ok(out)
    }
}

fn unavailable<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[async_trait]
impl CompanyStore for MemoryStore {
    async fn exists_by_ticker(&self, ticker: &str) -> StoreResult<bool> {
        let t = self.inner.lock().await;
        Ok(t.companies.iter().any(|c| c.ticker == ticker))
    }

    async fn save(&self, company: &Company) -> StoreResult<CompanyRecord> {
        let mut t = self.inner.lock().await;
        if t.companies.iter().any(|c| c.ticker == company.ticker) {
            return Err(StoreError::Integrity(format!(
                "duplicate ticker '{}'",
                company.ticker
            )));
        }
        self.commit(&mut t, |t| {
            t.next_company_id += 1;
            let record = CompanyRecord {
                id: t.next_company_id,
                ticker: company.ticker.clone(),
                name: company.name.clone(),
            };
            t.companies.push(record.clone());
            record
        })
        .await
    }

    async fn find_by_ticker(&self, ticker: &str) -> StoreResult<Option<CompanyRecord>> {
        let t = self.inner.lock().await;
        Ok(t.companies.iter().find(|c| c.ticker == ticker).cloned())
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<CompanyRecord>> {
        let t = self.inner.lock().await;
        Ok(t.companies.iter().find(|c| c.name == name).cloned())
    }

    async fn find_by_name_starting_with_ignore_case(
        &self,
        prefix: &str,
        limit: usize,
    ) -> StoreResult<Vec<CompanyRecord>> {
        let needle = prefix.to_lowercase();
        let t = self.inner.lock().await;
        let mut out: Vec<CompanyRecord> = t
            .companies
            .iter()
            .filter(|c| c.name.to_lowercase().starts_with(&needle))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out.truncate(limit);
        Ok(out)
    }

    async fn find_all(&self, page: usize, size: usize) -> StoreResult<Page<CompanyRecord>> {
        let t = self.inner.lock().await;
        let content = if size == 0 {
            Vec::new()
        } else {
            t.companies
                .iter()
                .skip(page.saturating_mul(size))
                .take(size)
                .cloned()
                .collect()
        };
        Ok(Page {
            content,
            page,
            size,
            total_elements: t.companies.len(),
        })
    }

    async fn delete(&self, company: &CompanyRecord) -> StoreResult<()> {
        let mut t = self.inner.lock().await;
        if t.dividends.iter().any(|d| d.company_id == company.id) {
            return Err(StoreError::Integrity(format!(
                "company {} still owns dividends",
                company.id
            )));
        }
        if !t.companies.iter().any(|c| c.id == company.id) {
            return Ok(());
        }
        self.commit(&mut t, |t| t.companies.retain(|c| c.id != company.id))
            .await
    }
}

#[async_trait]
impl DividendStore for MemoryStore {
    async fn save_all(&self, dividends: Vec<DividendRecord>) -> StoreResult<()> {
        let mut t = self.inner.lock().await;
        if let Some(orphan) = dividends
            .iter()
            .find(|d| !t.companies.iter().any(|c| c.id == d.company_id))
        {
            return Err(StoreError::Integrity(format!(
                "dividend references unknown company {}",
                orphan.company_id
            )));
        }
        self.commit(&mut t, |t| t.dividends.extend(dividends)).await
    }

    async fn find_all_by_company_id(&self, company_id: i64) -> StoreResult<Vec<DividendRecord>> {
        let t = self.inner.lock().await;
        Ok(t.dividends
            .iter()
            .filter(|d| d.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn delete_all_by_company_id(&self, company_id: i64) -> StoreResult<usize> {
        let mut t = self.inner.lock().await;
        let removed = t
            .dividends
            .iter()
            .filter(|d| d.company_id == company_id)
            .count();
        if removed == 0 {
            return Ok(0);
        }
        self.commit(&mut t, |t| t.dividends.retain(|d| d.company_id != company_id))
            .await?;
        Ok(removed)
    }
}
