use std::env;
use std::time::Duration;

use url::Url;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub api_base_url: String,
    pub storage_path: String,
    pub token_refresh_interval_secs: u64,
    pub cache_ttl_secs: u64,
    pub cache_max_entries: usize,
    pub search_debounce_ms: u64,
    pub page_size: u32,
    pub publish_min_interval_ms: u64,
    pub request_timeout_secs: u64,
}

impl Config {
    /// 默认配置，仅需后端地址
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Config {
            api_base_url: api_base_url.into(),
            storage_path: ".marketplace/storage.json".to_string(),
            // 访问令牌有效期 5 分钟，刷新间隔必须更短
            token_refresh_interval_secs: 4 * 60,
            cache_ttl_secs: 5 * 60,
            cache_max_entries: 50,
            search_debounce_ms: 500,
            page_size: 12,
            publish_min_interval_ms: 2000,
            request_timeout_secs: 15,
        }
    }

    pub fn from_env() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let api_base_url = env::var("API_BASE_URL")
            .map_err(|_| AppError::Config("API_BASE_URL is not set".into()))?;
        Url::parse(&api_base_url)?;

        let defaults = Config::new(api_base_url);
        Ok(Config {
            storage_path: env::var("STORAGE_PATH").unwrap_or(defaults.storage_path.clone()),
            token_refresh_interval_secs: env::var("TOKEN_REFRESH_INTERVAL")
                .ok()
                .and_then(|v| parse_secs(&v))
                .unwrap_or(defaults.token_refresh_interval_secs),
            cache_ttl_secs: env::var("CACHE_TTL")
                .ok()
                .and_then(|v| parse_secs(&v))
                .unwrap_or(defaults.cache_ttl_secs),
            cache_max_entries: env_parse("CACHE_MAX_ENTRIES").unwrap_or(defaults.cache_max_entries),
            search_debounce_ms: env_parse("SEARCH_DEBOUNCE_MS").unwrap_or(defaults.search_debounce_ms),
            page_size: env_parse("PAGE_SIZE").unwrap_or(defaults.page_size),
            publish_min_interval_ms: env_parse("PUBLISH_MIN_INTERVAL_MS")
                .unwrap_or(defaults.publish_min_interval_ms),
            request_timeout_secs: env::var("REQUEST_TIMEOUT")
                .ok()
                .and_then(|v| parse_secs(&v))
                .unwrap_or(defaults.request_timeout_secs),
            ..defaults
        })
    }

    pub fn token_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.token_refresh_interval_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn publish_min_interval(&self) -> Duration {
        Duration::from_millis(self.publish_min_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// 支持 "240"、"240s"、"4m"、"1h"
fn parse_secs(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Some(v) = raw.strip_suffix('h') {
        return v.parse::<u64>().ok().map(|h| h * 3600);
    }
    if let Some(v) = raw.strip_suffix('m') {
        return v.parse::<u64>().ok().map(|m| m * 60);
    }
    raw.trim_end_matches('s').parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_duration_suffixes() {
        assert_eq!(parse_secs("240"), Some(240));
        assert_eq!(parse_secs("30s"), Some(30));
        assert_eq!(parse_secs("4m"), Some(240));
        assert_eq!(parse_secs("1h"), Some(3600));
        assert_eq!(parse_secs("soon"), None);
    }

    #[test]
    fn defaults_keep_refresh_shorter_than_cache_ttl() {
        let config = Config::new("http://localhost:8000/api/");
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.search_debounce(), Duration::from_millis(500));
        assert!(config.token_refresh_interval() < Duration::from_secs(300));
    }
}
