//! Runtime configuration.
//!
//! Loaded from the environment, after reading a `.env` file if present.
//! Every knob has a default except the database URL, which is only needed
//! when talking to Postgres.

use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::views::{DEFAULT_RECENT_CAPACITY, DEFAULT_SEEN_CAPACITY, DEFAULT_SEEN_TTL};
use crate::{Error, Result};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_HOME_LIST_SIZE: u32 = 6;
pub const DEFAULT_POOL_SIZE: usize = 16;
pub const DEFAULT_POOL_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Postgres connection string (`DATABASE_URL`)
    pub database_url: Option<String>,

    /// Posts per category page (`GAZETTE_PAGE_SIZE`)
    pub page_size: u32,

    /// Posts in each home page list (`GAZETTE_HOME_LIST_SIZE`)
    pub home_list_size: u32,

    /// Post ids a visitor token remembers (`GAZETTE_RECENT_VIEWS_CAPACITY`)
    pub recent_views_capacity: usize,

    /// Server-side dedup entries (`GAZETTE_SEEN_VIEWS_CAPACITY`)
    pub seen_views_capacity: usize,

    /// Server-side dedup lifetime (`GAZETTE_SEEN_VIEWS_TTL_SECS`)
    pub seen_views_ttl: Duration,

    /// Max pooled connections (`GAZETTE_POOL_SIZE`)
    pub pool_size: usize,

    /// How long to wait for a pooled connection (`GAZETTE_POOL_TIMEOUT_SECS`)
    pub pool_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            page_size: DEFAULT_PAGE_SIZE,
            home_list_size: DEFAULT_HOME_LIST_SIZE,
            recent_views_capacity: DEFAULT_RECENT_CAPACITY,
            seen_views_capacity: DEFAULT_SEEN_CAPACITY,
            seen_views_ttl: DEFAULT_SEEN_TTL,
            pool_size: DEFAULT_POOL_SIZE,
            pool_timeout: DEFAULT_POOL_TIMEOUT,
        }
    }
}

impl Config {
    /// Load from the process environment, reading `.env` first.
    pub fn from_env() -> Result<Self> {
        // Missing .env is fine
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());

        let page_size = positive(&lookup, "GAZETTE_PAGE_SIZE", defaults.page_size)?;
        let home_list_size = positive(&lookup, "GAZETTE_HOME_LIST_SIZE", defaults.home_list_size)?;
        let recent_views_capacity = positive(
            &lookup,
            "GAZETTE_RECENT_VIEWS_CAPACITY",
            defaults.recent_views_capacity,
        )?;
        let seen_views_capacity = positive(
            &lookup,
            "GAZETTE_SEEN_VIEWS_CAPACITY",
            defaults.seen_views_capacity,
        )?;
        let seen_views_ttl = Duration::from_secs(positive(
            &lookup,
            "GAZETTE_SEEN_VIEWS_TTL_SECS",
            defaults.seen_views_ttl.as_secs(),
        )?);
        let pool_size = positive(&lookup, "GAZETTE_POOL_SIZE", defaults.pool_size)?;
        let pool_timeout = Duration::from_secs(positive(
            &lookup,
            "GAZETTE_POOL_TIMEOUT_SECS",
            defaults.pool_timeout.as_secs(),
        )?);

        Ok(Self {
            database_url,
            page_size,
            home_list_size,
            recent_views_capacity,
            seen_views_capacity,
            seen_views_ttl,
            pool_size,
            pool_timeout,
        })
    }

    /// The database URL, or a config error naming the missing variable.
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .ok_or_else(|| Error::config("DATABASE_URL is not set"))
    }
}

/// Parse `key` as a number greater than zero, or return `default` when unset.
fn positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr + PartialEq + Default,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(default);
    }
    match raw.parse::<T>() {
        Ok(value) if value != T::default() => Ok(value),
        Ok(_) => Err(Error::config(format!("{key} must be greater than zero"))),
        Err(_) => Err(Error::config(format!("{key}: invalid number '{raw}'"))),
    }
}
