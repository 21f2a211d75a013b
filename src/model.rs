//! Domain records shared by the store, the cache and the scrape provider.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Company identity as resolved by the scrape provider.
/// `ticker` is the natural key (case-sensitive); `name` is the display/search key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Company {
    pub ticker: String,
    pub name: String,
}

impl Company {
    pub fn new(ticker: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            name: name.into(),
        }
    }
}

/// One dividend payout. Owned by exactly one company once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dividend {
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// Company plus its dividend history. Produced by the provider, cached by the
/// query service, never stored as its own row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedResult {
    pub company: Company,
    #[serde(default)]
    pub dividends: Vec<Dividend>,
}

/// A stored company with its generated identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub id: i64,
    pub ticker: String,
    pub name: String,
}

impl CompanyRecord {
    pub fn company(&self) -> Company {
        Company::new(&self.ticker, &self.name)
    }
}

/// A stored dividend row bound to its owning company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividendRecord {
    pub company_id: i64,
    pub date: NaiveDate,
    pub amount: Decimal,
}

impl DividendRecord {
    pub fn bind(company_id: i64, dividend: &Dividend) -> Self {
        Self {
            company_id,
            date: dividend.date,
            amount: dividend.amount,
        }
    }

    pub fn dividend(&self) -> Dividend {
        Dividend {
            date: self.date,
            amount: self.amount,
        }
    }
}

/// Zero-based page of results, as returned by `find_all`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total_elements: usize,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> usize {
        if self.size == 0 {
            0
        } else {
            self.total_elements.div_ceil(self.size)
        }
    }
}
