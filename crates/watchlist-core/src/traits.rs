use async_trait::async_trait;

use crate::{
    DailyClose, FearGreedReading, FetchError, LiveQuote, MacroSeries, Observation, SecurityProfile,
    TreasuryRates,
};

/// Market-wide fear & greed index provider
#[async_trait]
pub trait SentimentSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fear_greed(&self) -> Result<FearGreedReading, FetchError>;
}

/// Daily closes for indices and other tickers (VIX, S&P 500, Nasdaq)
#[async_trait]
pub trait MarketHistorySource: Send + Sync {
    fn name(&self) -> &str;

    /// Closes for roughly the last `days` calendar days, oldest first
    async fn daily_closes(&self, symbol: &str, days: u32) -> Result<Vec<DailyClose>, FetchError>;
}

/// Monthly macro statistics provider
#[async_trait]
pub trait MacroSeriesSource: Send + Sync {
    fn name(&self) -> &str;

    /// Up to `limit` most recent observations, in any order
    async fn observations(&self, series: MacroSeries, limit: usize) -> Result<Vec<Observation>, FetchError>;
}

/// Treasury yields used for the curve spread
#[async_trait]
pub trait RatesSource: Send + Sync {
    fn name(&self) -> &str;

    async fn treasury_rates(&self) -> Result<TreasuryRates, FetchError>;
}

/// Per-symbol quote, fundamentals and price history
#[async_trait]
pub trait SecuritySource: Send + Sync {
    fn name(&self) -> &str;

    async fn profile(&self, symbol: &str) -> Result<SecurityProfile, FetchError>;

    async fn quote(&self, symbol: &str) -> Result<LiveQuote, FetchError>;
}
