// Environment-driven settings. `main` loads `.env` before calling `Settings::from_env`.
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::client::currency::CurrencyFormat;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://pricemonitor.db";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_ASSETS_DIR: &str = "assets";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_REFRESH_BATCH_SIZE: usize = 5;
pub const DEFAULT_REFRESH_PAUSE_MS: u64 = 500;
pub const DEFAULT_HISTORY_LIMIT: u32 = 30;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Per-request deadline applied to every HTTP route.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub assets_dir: String,
    pub refresh: RefreshSettings,
    pub history_limit: u32,
    pub page_size: u32,
    pub currency: CurrencyFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSettings {
    pub interval: Duration,
    pub batch_size: usize,
    pub pause: Duration,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            batch_size: DEFAULT_REFRESH_BATCH_SIZE,
            pause: Duration::from_millis(DEFAULT_REFRESH_PAUSE_MS),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            assets_dir: DEFAULT_ASSETS_DIR.to_string(),
            refresh: RefreshSettings::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            page_size: DEFAULT_PAGE_SIZE,
            currency: CurrencyFormat::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let currency = CurrencyFormat {
            marker: get("CURRENCY_MARKER").unwrap_or(defaults.currency.marker),
            separator: match get("CURRENCY_SEPARATOR") {
                Some(sep) => sep
                    .chars()
                    .next()
                    .context("CURRENCY_SEPARATOR must not be empty")?,
                None => defaults.currency.separator,
            },
        };

        let interval_secs: u64 =
            parse_or(&get, "REFRESH_INTERVAL_SECS", DEFAULT_REFRESH_INTERVAL_SECS)?;
        if interval_secs == 0 {
            bail!("REFRESH_INTERVAL_SECS must be at least 1 second");
        }

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or(&get, "PORT", defaults.port)?,
            max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", defaults.max_connections)?,
            assets_dir: get("ASSETS_DIR").unwrap_or(defaults.assets_dir),
            refresh: RefreshSettings {
                interval: Duration::from_secs(interval_secs),
                batch_size: parse_or(&get, "REFRESH_BATCH_SIZE", DEFAULT_REFRESH_BATCH_SIZE)?
                    .max(1),
                pause: Duration::from_millis(parse_or(
                    &get,
                    "REFRESH_PAUSE_MS",
                    DEFAULT_REFRESH_PAUSE_MS,
                )?),
            },
            history_limit: parse_or(&get, "HISTORY_LIMIT", defaults.history_limit)?,
            page_size: parse_or(&get, "PAGE_SIZE", defaults.page_size)?,
            currency,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value {raw:?}")),
        None => Ok(default),
    }
}
