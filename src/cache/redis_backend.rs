//! Redis-backed cache. Values are JSON, written with `SET key value EX ttl`,
//! keys are `{prefix}::{company name}`. Expiry is left to Redis.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError};

use super::{CacheError, CacheResult, DividendCache};
use crate::model::ScrapedResult;

impl From<RedisError> for CacheError {
    fn from(e: RedisError) -> Self {
        if e.is_connection_refusal()
            || e.is_io_error()
            || e.is_timeout()
            || e.is_connection_dropped()
        {
            CacheError::Connection(e.to_string())
        } else {
            CacheError::Backend(e.to_string())
        }
    }
}

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    ttl_secs: u64,
    prefix: String,
}

impl RedisCache {
    /// Opens a managed connection. Fails with [`CacheError::Connection`] when
    /// the server cannot be reached.
    pub async fn connect(url: &str, ttl_secs: u64, prefix: &str) -> CacheResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        tracing::info!(ttl_secs, prefix, "redis cache connected");
        Ok(Self {
            conn,
            ttl_secs: ttl_secs.max(1),
            prefix: prefix.to_string(),
        })
    }

    fn key(&self, name: &str) -> String {
        cache_key(&self.prefix, name)
    }
}

fn cache_key(prefix: &str, name: &str) -> String {
    format!("{prefix}::{name}")
}

fn decode(raw: Option<String>) -> CacheResult<Option<ScrapedResult>> {
    raw.map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(|e| CacheError::Codec(e.to_string()))
}

#[async_trait]
impl DividendCache for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<ScrapedResult>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(self.key(key)).await?;
        decode(raw)
    }

    async fn put(&self, key: &str, value: &ScrapedResult) -> CacheResult<()> {
        let json = serde_json::to_string(value).map_err(|e| CacheError::Codec(e.to_string()))?;
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(self.key(key), json, self.ttl_secs).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn refused_connection_maps_to_connection_error() {
        let e = RedisError::from(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        assert!(matches!(CacheError::from(e), CacheError::Connection(_)));
    }

    #[test]
    fn keys_are_prefixed_with_double_colon() {
        assert_eq!(cache_key("finance", "3M Company"), "finance::3M Company");
        assert_eq!(cache_key("", "KO"), "::KO");
    }

    #[test]
    fn stored_values_decode_or_report_codec_error() {
        assert_eq!(decode(None), Ok(None));

        let hit = decode(Some(
            r#"{"company":{"ticker":"KO","name":"Coca-Cola"},"dividends":[{"date":"2024-03-14","amount":"0.485"}]}"#
                .to_string(),
        ))
        .unwrap()
        .expect("hit");
        assert_eq!(hit.company.name, "Coca-Cola");
        assert_eq!(hit.dividends.len(), 1);

        assert!(matches!(
            decode(Some("not json".to_string())),
            Err(CacheError::Codec(_))
        ));
    }
}
