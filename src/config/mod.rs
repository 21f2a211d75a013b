//! Application configuration: TOML file plus a handful of env overrides.
//!
//! Lookup order for the file:
//! 1) $DIVIDEND_CONFIG_PATH (must exist when set)
//! 2) config/app.toml
//! 3) built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::scrape::ScrapePolicy;

pub const ENV_CONFIG_PATH: &str = "DIVIDEND_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";

const ENV_CACHE_BACKEND: &str = "DIVIDEND_CACHE_BACKEND";
const ENV_REDIS_URL: &str = "DIVIDEND_REDIS_URL";
const ENV_CACHE_TTL_SECS: &str = "DIVIDEND_CACHE_TTL_SECS";
const ENV_SCRAPE_BASE_URL: &str = "DIVIDEND_SCRAPE_BASE_URL";
const ENV_SCRAPE_TIMEOUT_MS: &str = "DIVIDEND_SCRAPE_TIMEOUT_MS";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub cache: CacheConfig,
    pub scrape: ScrapeConfig,
    pub index: IndexConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON snapshot file; `None` keeps the store purely in memory.
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub redis_url: String,
    pub ttl_secs: u64,
    pub max_entries: usize,
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            redis_url: "redis://127.0.0.1:6379/".to_string(),
            ttl_secs: 3600,
            max_entries: 10_000,
            key_prefix: "finance".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Scraping sidecar base URL. Takes precedence over `fixtures_path`.
    pub base_url: Option<String>,
    pub fixtures_path: Option<PathBuf>,
    pub timeout_ms: u64,
    pub retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            fixtures_path: None,
            timeout_ms: 10_000,
            retries: 0,
            retry_backoff_ms: 250,
        }
    }
}

impl ScrapeConfig {
    pub fn policy(&self) -> ScrapePolicy {
        ScrapePolicy {
            timeout: Duration::from_millis(self.timeout_ms),
            retries: self.retries,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Upper bound on indexed names; unbounded when absent.
    pub max_entries: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub autocomplete_limit: usize,
    pub suggestion_limit: usize,
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            autocomplete_limit: 10,
            suggestion_limit: 10,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s).context("parsing app config")?;
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// File lookup as described in the module docs, then env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from(Path::new(DEFAULT_CONFIG_PATH))?
        } else {
            AppConfig::default()
        };
        cfg.apply_env()?;
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var(ENV_CACHE_BACKEND) {
            self.cache.backend = match v.trim().to_ascii_lowercase().as_str() {
                "memory" => CacheBackend::Memory,
                "redis" => CacheBackend::Redis,
                other => anyhow::bail!("Unsupported cache backend in {ENV_CACHE_BACKEND}: {other}"),
            };
        }
        if let Ok(v) = std::env::var(ENV_REDIS_URL) {
            self.cache.redis_url = v;
        }
        if let Ok(v) = std::env::var(ENV_CACHE_TTL_SECS) {
            self.cache.ttl_secs = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_CACHE_TTL_SECS} must be an integer"))?;
        }
        if let Ok(v) = std::env::var(ENV_SCRAPE_BASE_URL) {
            self.scrape.base_url = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Ok(v) = std::env::var(ENV_SCRAPE_TIMEOUT_MS) {
            self.scrape.timeout_ms = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_SCRAPE_TIMEOUT_MS} must be an integer"))?;
        }
        Ok(())
    }

    fn sanitize(&mut self) {
        if self.cache.ttl_secs == 0 {
            self.cache.ttl_secs = CacheConfig::default().ttl_secs;
        }
        if self.cache.max_entries == 0 {
            self.cache.max_entries = CacheConfig::default().max_entries;
        }
        if self.scrape.timeout_ms == 0 {
            self.scrape.timeout_ms = ScrapeConfig::default().timeout_ms;
        }
        let api = ApiConfig::default();
        if self.api.max_page_size == 0 {
            self.api.max_page_size = api.max_page_size;
        }
        if self.api.default_page_size == 0 {
            self.api.default_page_size = api.default_page_size;
        }
        self.api.default_page_size = self.api.default_page_size.min(self.api.max_page_size);
        if self.api.autocomplete_limit == 0 {
            self.api.autocomplete_limit = api.autocomplete_limit;
        }
        if self.api.suggestion_limit == 0 {
            self.api.suggestion_limit = api.suggestion_limit;
        }
    }
}
