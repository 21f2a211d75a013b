//! In-process cache with absolute TTL and a capacity bound.
//! Expired entries are dropped on read; when full, the oldest insert is evicted.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{CacheResult, DividendCache};
use crate::model::ScrapedResult;

#[derive(Debug)]
struct Entry {
    stored_at: Instant,
    value: ScrapedResult,
}

#[derive(Debug)]
pub struct MemoryCache {
    inner: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
    max_entries: usize,
}

impl MemoryCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DividendCache for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<ScrapedResult>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let expired = match map.get(key) {
            None => return Ok(None),
            Some(e) => e.stored_at.elapsed() >= self.ttl,
        };
        if expired {
            map.remove(key);
            return Ok(None);
        }
        Ok(map.get(key).map(|e| e.value.clone()))
    }

    async fn put(&self, key: &str, value: &ScrapedResult) -> CacheResult<()> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if !map.contains_key(key) && map.len() >= self.max_entries {
            let oldest = map
                .iter()
                .min_by_key(|(_, e)| e.stored_at)
                .map(|(k, _)| k.clone());
            if let Some(k) = oldest {
                map.remove(&k);
            }
        }
        map.insert(
            key.to_string(),
            Entry {
                stored_at: Instant::now(),
                value: value.clone(),
            },
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
