//! File-backed provider: every source trait served from JSON files under
//! one directory. Used for offline runs and demos.
//!
//! Layout:
//!   fear_greed.json            FearGreedReading
//!   history/<SYMBOL>.json      [DailyClose]
//!   series/<SERIES_ID>.json    [Observation]
//!   rates.json                 TreasuryRates
//!   securities/<SYMBOL>.json   SecurityProfile

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use watchlist_core::{
    DailyClose, FearGreedReading, FetchError, LiveQuote, MacroSeries, MacroSeriesSource, MarketHistorySource,
    Observation, RatesSource, SecurityProfile, SecuritySource, SentimentSource, TreasuryRates,
};

const NAME: &str = "fixtures";

pub struct FixtureProvider {
    root: PathBuf,
}

impl FixtureProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<dir>/<SYMBOL>.json`; symbols that could leave `dir` are rejected
    fn symbol_file(dir: &str, symbol: &str) -> Result<PathBuf, FetchError> {
        let unsafe_symbol = symbol.is_empty()
            || symbol.contains("..")
            || symbol.chars().any(|c| c == '/' || c == '\\' || c == ':' || c.is_control());
        if unsafe_symbol {
            return Err(FetchError::Malformed(format!("invalid symbol {:?}", symbol)));
        }
        Ok(Path::new(dir).join(format!("{}.json", symbol)))
    }

    async fn read_json<T: DeserializeOwned>(&self, relative: impl AsRef<Path>) -> Result<T, FetchError> {
        let path = self.root.join(relative);
        let raw = tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => FetchError::NoData(format!("{} not found", path.display())),
            _ => FetchError::Provider(format!("{}: {}", path.display(), e)),
        })?;
        serde_json::from_str(&raw).map_err(|e| FetchError::Malformed(format!("{}: {}", path.display(), e)))
    }
}

#[async_trait]
impl SentimentSource for FixtureProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn fear_greed(&self) -> Result<FearGreedReading, FetchError> {
        let mut reading: FearGreedReading = self.read_json("fear_greed.json").await?;
        if reading.source.is_empty() {
            reading.source = NAME.to_string();
        }
        Ok(reading)
    }
}

#[async_trait]
impl MarketHistorySource for FixtureProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn daily_closes(&self, symbol: &str, days: u32) -> Result<Vec<DailyClose>, FetchError> {
        let mut closes: Vec<DailyClose> = self.read_json(Self::symbol_file("history", symbol)?).await?;
        closes.sort_by_key(|c| c.date);
        let skip = closes.len().saturating_sub(days as usize);
        Ok(closes.split_off(skip))
    }
}

#[async_trait]
impl MacroSeriesSource for FixtureProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn observations(&self, series: MacroSeries, limit: usize) -> Result<Vec<Observation>, FetchError> {
        let mut observations: Vec<Observation> = self
            .read_json(Path::new("series").join(format!("{}.json", series.series_id())))
            .await?;
        observations.sort_by(|a, b| b.date.cmp(&a.date));
        observations.truncate(limit);
        Ok(observations)
    }
}

#[async_trait]
impl RatesSource for FixtureProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn treasury_rates(&self) -> Result<TreasuryRates, FetchError> {
        self.read_json("rates.json").await
    }
}

#[async_trait]
impl SecuritySource for FixtureProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn profile(&self, symbol: &str) -> Result<SecurityProfile, FetchError> {
        let mut profile: SecurityProfile = self.read_json(Self::symbol_file("securities", symbol)?).await?;
        if profile.symbol.is_empty() {
            profile.symbol = symbol.to_string();
        }
        Ok(profile)
    }

    /// Quoted price, or the latest close when the file has none. The
    /// previous close is the second most recent bar.
    async fn quote(&self, symbol: &str) -> Result<LiveQuote, FetchError> {
        let profile = self.profile(symbol).await?;
        let mut closes: Vec<_> = profile.bars.iter().map(|b| (b.date, b.close)).collect();
        closes.sort_by(|a, b| b.0.cmp(&a.0));

        let price = profile
            .regular_market_price
            .or_else(|| closes.first().map(|(_, close)| *close))
            .ok_or_else(|| FetchError::NoData(format!("no price for {}", symbol)))?;
        Ok(LiveQuote {
            symbol: symbol.to_string(),
            price,
            previous_close: closes.get(1).map(|(_, close)| *close),
            as_of: Utc::now(),
        })
    }
}
