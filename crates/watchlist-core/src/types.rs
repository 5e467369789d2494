use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Security vs. diversified fund. Funds skip fundamental scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    #[default]
    Security,
    Fund,
}

/// Daily OHLC subset delivered by a history provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub high: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}

/// Analyst recommendation counts for the current period
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationCounts {
    #[serde(default)]
    pub strong_buy: u32,
    #[serde(default)]
    pub buy: u32,
    #[serde(default)]
    pub hold: u32,
    #[serde(default)]
    pub sell: u32,
    #[serde(default)]
    pub strong_sell: u32,
}

impl RecommendationCounts {
    pub fn total(&self) -> u32 {
        self.strong_buy + self.buy + self.hold + self.sell + self.strong_sell
    }

    /// Share of buy + strong buy ratings in percent, `None` without coverage
    pub fn buy_ratio_pct(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        Some((self.strong_buy + self.buy) as f64 / total as f64 * 100.0)
    }
}

/// Raw per-symbol payload as returned by a [`crate::SecuritySource`].
///
/// Ratios follow the provider convention: growth rates and ROE are fractions
/// (0.12 = 12%), multi-year returns too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityProfile {
    pub symbol: String,
    pub name: Option<String>,
    pub currency: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub quote_type: Option<String>,
    pub regular_market_price: Option<f64>,
    pub forward_pe: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub earnings_growth: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub target_mean_price: Option<f64>,
    pub number_of_analysts: Option<u32>,
    pub recommendations: Option<RecommendationCounts>,
    pub ytd_return: Option<f64>,
    pub three_year_return: Option<f64>,
    pub total_assets: Option<f64>,
    /// Oldest first, up to five years of sessions
    pub bars: Vec<DailyBar>,
}

/// Latest traded price for a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveQuote {
    pub symbol: String,
    pub price: f64,
    #[serde(default)]
    pub previous_close: Option<f64>,
    pub as_of: DateTime<Utc>,
}

/// One line of the prices view. Only the symbol is guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: String,
    pub price: Option<f64>,
    pub previous_close: Option<f64>,
    /// Percent move from the previous close, 2 decimals
    pub change_pct: Option<f64>,
}

/// One session of the 1-year chart series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: f64,
    pub ma20: Option<f64>,
    pub ma60: Option<f64>,
    pub ma120: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fundamentals {
    pub forward_pe: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub fcf_positive: Option<bool>,
    pub eps_growth_pct: Option<f64>,
    pub revenue_growth_pct: Option<f64>,
    pub roe_pct: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
}

/// Moving-average stacking relative to the current price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaAlignment {
    /// price > short MA > long MA
    Bullish,
    /// price above the long MA, or short MA above long MA
    Partial,
    Bearish,
}

impl MaAlignment {
    pub fn name(&self) -> &'static str {
        match self {
            MaAlignment::Bullish => "bullish",
            MaAlignment::Partial => "partial",
            MaAlignment::Bearish => "bearish",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Technicals {
    pub rsi: Option<f64>,
    pub macd_bullish: Option<bool>,
    pub ma_alignment: Option<MaAlignment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalystConsensus {
    pub buy_ratio_pct: Option<f64>,
    pub analyst_count: Option<u32>,
    pub target_price: Option<f64>,
    pub target_upside_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundMetrics {
    pub ytd_return_pct: Option<f64>,
    pub three_year_return_pct: Option<f64>,
    pub total_assets: Option<f64>,
}

/// Everything known about one symbol at fetch time.
///
/// Every numeric field is optional. A snapshot with `error` set is the
/// explicit "unavailable" result: no provider answered and nothing was cached.
/// `stale` marks a snapshot served from an expired cache entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolSnapshot {
    pub symbol: String,
    pub name: Option<String>,
    pub currency: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub asset_class: AssetClass,
    pub price: Option<f64>,
    pub ath: Option<f64>,
    pub ath_date: Option<NaiveDate>,
    pub high_52w: Option<f64>,
    pub ath_drawdown_pct: Option<f64>,
    pub high_52w_drawdown_pct: Option<f64>,
    pub fundamentals: Fundamentals,
    pub technicals: Technicals,
    pub analyst: AnalystConsensus,
    pub fund: FundMetrics,
    pub price_history: Vec<PricePoint>,
    pub updated_at: Option<DateTime<Utc>>,
    pub stale: bool,
    pub error: Option<String>,
}

impl SymbolSnapshot {
    pub fn unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            error: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn is_available(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_fund(&self) -> bool {
        self.asset_class == AssetClass::Fund
    }
}

/// Macro inputs shared by every symbol in one scoring pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroContext {
    /// Composite market fear, 0-100
    pub fear_score: u32,
    /// 10y minus 2y, percentage points
    pub yield_spread: Option<f64>,
    pub m2_yoy_pct: Option<f64>,
    /// Months the current expansion/contraction regime has persisted
    pub m2_consecutive_months: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    StrongBuy,
    BuyConsider,
    HoldWatch,
    Avoid,
}

impl Grade {
    pub fn from_score(total: u32) -> Self {
        match total {
            70.. => Grade::StrongBuy,
            50..=69 => Grade::BuyConsider,
            30..=49 => Grade::HoldWatch,
            _ => Grade::Avoid,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::StrongBuy => "strong buy",
            Grade::BuyConsider => "buy-consider",
            Grade::HoldWatch => "hold/watch",
            Grade::Avoid => "avoid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub fear_score: u32,
    pub drawdown_score: u32,
    /// `None` for funds: not applicable, distinct from zero
    pub fundamental_score: Option<u32>,
    pub technical_score: u32,
    pub recession_penalty: u32,
    pub liquidity_adjustment: i32,
    /// Weighted sub-score blend before macro adjustments, rounded
    pub combined_score: i32,
    pub total_score: u32,
    pub grade: Grade,
    pub reasons: Vec<String>,
}

impl ScoreResult {
    pub fn summary(&self) -> String {
        self.reasons.join(" + ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSymbol {
    pub snapshot: SymbolSnapshot,
    pub score: ScoreResult,
}
