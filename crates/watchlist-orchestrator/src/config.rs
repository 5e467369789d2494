use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::SignalClass;

/// Freshness window per signal class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheTtls {
    pub fear_greed: Duration,
    pub volatility: Duration,
    pub market_rsi: Duration,
    pub inflation: Duration,
    pub money_supply: Duration,
    pub yield_curve: Duration,
    pub stock: Duration,
    pub price: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            fear_greed: Duration::from_secs(3600),
            volatility: Duration::from_secs(3600),
            market_rsi: Duration::from_secs(3600),
            inflation: Duration::from_secs(86400),
            money_supply: Duration::from_secs(86400),
            yield_curve: Duration::from_secs(3600),
            stock: Duration::from_secs(21600),
            price: Duration::from_secs(10),
        }
    }
}

impl CacheTtls {
    pub fn for_class(&self, class: SignalClass) -> Duration {
        match class {
            SignalClass::FearGreed => self.fear_greed,
            SignalClass::Volatility => self.volatility,
            SignalClass::MarketRsi => self.market_rsi,
            SignalClass::Inflation => self.inflation,
            SignalClass::MoneySupply => self.money_supply,
            SignalClass::YieldCurve => self.yield_curve,
            SignalClass::Stock => self.stock,
            SignalClass::Price => self.price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// sqlx SQLite URL for the durable cache layer
    pub database_url: String,
    pub ttls: CacheTtls,
    /// Per provider call
    pub fetch_timeout: Duration,
    /// Upper bound on concurrent per-symbol fetches
    pub max_workers: usize,
    /// Pending durable writes before new ones are dropped
    pub write_queue: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:watchlist.db".to_string(),
            ttls: CacheTtls::default(),
            fetch_timeout: Duration::from_secs(10),
            max_workers: 8,
            write_queue: 1024,
        }
    }
}

impl OrchestratorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source; unset variables keep defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let secs = |name: &str, default: Duration| -> Result<Duration> {
            match lookup(name) {
                Some(raw) => {
                    let secs: u64 = raw
                        .trim()
                        .parse()
                        .with_context(|| format!("{} must be whole seconds, got {:?}", name, raw))?;
                    Ok(Duration::from_secs(secs))
                }
                None => Ok(default),
            }
        };
        let count = |name: &str, default: usize| -> Result<usize> {
            match lookup(name) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{} must be a positive integer, got {:?}", name, raw)),
                None => Ok(default),
            }
        };

        let database_url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => format!(
                "sqlite:{}",
                lookup("DB_PATH").unwrap_or_else(|| "watchlist.db".to_string())
            ),
        };

        let d = &defaults.ttls;
        let ttls = CacheTtls {
            fear_greed: secs("CACHE_TTL_FEAR_GREED", d.fear_greed)?,
            volatility: secs("CACHE_TTL_VIX", d.volatility)?,
            market_rsi: secs("CACHE_TTL_MARKET_RSI", d.market_rsi)?,
            inflation: secs("CACHE_TTL_CPI", d.inflation)?,
            money_supply: secs("CACHE_TTL_M2", d.money_supply)?,
            yield_curve: secs("CACHE_TTL_YIELD_CURVE", d.yield_curve)?,
            stock: secs("CACHE_TTL_STOCK", d.stock)?,
            price: secs("CACHE_TTL_PRICE", d.price)?,
        };

        let max_workers = count("MAX_FETCH_WORKERS", defaults.max_workers)?;
        if max_workers == 0 {
            anyhow::bail!("MAX_FETCH_WORKERS must be at least 1");
        }

        Ok(Self {
            database_url,
            ttls,
            fetch_timeout: secs("FETCH_TIMEOUT_SECS", defaults.fetch_timeout)?,
            max_workers,
            write_queue: count("CACHE_WRITE_QUEUE", defaults.write_queue)?,
        })
    }
}
