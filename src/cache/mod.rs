//! Read-through cache port for assembled dividend results.
//!
//! Entries are keyed by company name. Lifetime and eviction belong to the
//! backend; services never evict explicitly. A backend that cannot reach its
//! server must answer [`CacheError::Connection`], never a miss.

pub mod memory;
pub mod redis_backend;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::ScrapedResult;

pub use self::memory::MemoryCache;
pub use self::redis_backend::RedisCache;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache connection failure: {0}")]
    Connection(String),
    #[error("cache value could not be decoded: {0}")]
    Codec(String),
    #[error("cache backend error: {0}")]
    Backend(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

#[async_trait]
pub trait DividendCache: Send + Sync {
    /// `Ok(None)` is a miss.
    async fn get(&self, key: &str) -> CacheResult<Option<ScrapedResult>>;

    async fn put(&self, key: &str, value: &ScrapedResult) -> CacheResult<()>;

    fn name(&self) -> &'static str;
}
