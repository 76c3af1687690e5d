//! Настройки внешних API из переменных окружения и `.env`.

use std::env;
use std::time::Duration;

const DEFAULT_APILAYER_BASE_URL: &str = "https://api.apilayer.com";
const DEFAULT_ALPHAVANTAGE_BASE_URL: &str = "https://www.alphavantage.co";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Ключи и адреса внешних API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Ключ Exchange Rates Data API (`APILAYER_EDAPI_KEY`).
    pub apilayer_key: Option<String>,
    /// Ключ Alpha Vantage (`ALPHAVANTAGE_KEY`).
    pub alphavantage_key: Option<String>,
    /// Базовый адрес apilayer (`APILAYER_BASE_URL`).
    pub apilayer_base_url: String,
    /// Базовый адрес Alpha Vantage (`ALPHAVANTAGE_BASE_URL`).
    pub alphavantage_base_url: String,
    /// Таймаут HTTP-запросов (`HTTP_TIMEOUT_SECS`).
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            apilayer_key: None,
            alphavantage_key: None,
            apilayer_base_url: DEFAULT_APILAYER_BASE_URL.to_string(),
            alphavantage_base_url: DEFAULT_ALPHAVANTAGE_BASE_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Подгружает `.env`, если он есть, и читает переменные окружения.
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), ".env loaded"),
            Err(err) if err.not_found() => {}
            Err(err) => tracing::warn!(%err, "failed to read .env"),
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Строит конфигурацию из произвольного источника переменных.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        let http_timeout = non_empty("HTTP_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or(defaults.http_timeout, Duration::from_secs);

        Self {
            apilayer_key: non_empty("APILAYER_EDAPI_KEY"),
            alphavantage_key: non_empty("ALPHAVANTAGE_KEY"),
            apilayer_base_url: non_empty("APILAYER_BASE_URL").unwrap_or(defaults.apilayer_base_url),
            alphavantage_base_url: non_empty("ALPHAVANTAGE_BASE_URL")
                .unwrap_or(defaults.alphavantage_base_url),
            http_timeout,
        }
    }
}
