use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::DailyClose;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FearGreedLabel {
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

impl FearGreedLabel {
    pub fn classify(value: f64) -> Self {
        if value <= 25.0 {
            FearGreedLabel::ExtremeFear
        } else if value <= 45.0 {
            FearGreedLabel::Fear
        } else if value <= 55.0 {
            FearGreedLabel::Neutral
        } else if value <= 75.0 {
            FearGreedLabel::Greed
        } else {
            FearGreedLabel::ExtremeGreed
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FearGreedLabel::ExtremeFear => "Extreme Fear",
            FearGreedLabel::Fear => "Fear",
            FearGreedLabel::Neutral => "Neutral",
            FearGreedLabel::Greed => "Greed",
            FearGreedLabel::ExtremeGreed => "Extreme Greed",
        }
    }
}

/// Fear & greed index, 0 = extreme fear, 100 = extreme greed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FearGreedReading {
    pub value: f64,
    #[serde(default)]
    pub previous_close: Option<f64>,
    #[serde(default)]
    pub source: String,
}

impl FearGreedReading {
    pub fn label(&self) -> FearGreedLabel {
        FearGreedLabel::classify(self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VixLevel {
    Low,
    Normal,
    High,
    Extreme,
}

impl VixLevel {
    pub fn classify(vix: f64) -> Self {
        if vix < 15.0 {
            VixLevel::Low
        } else if vix < 25.0 {
            VixLevel::Normal
        } else if vix < 35.0 {
            VixLevel::High
        } else {
            VixLevel::Extreme
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VixReading {
    pub current: f64,
    pub previous: Option<f64>,
    pub change_pct: Option<f64>,
    pub level: VixLevel,
    /// Last 20 sessions, oldest first
    pub history: Vec<DailyClose>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiZone {
    Oversold,
    Neutral,
    Overbought,
}

impl RsiZone {
    pub fn classify(rsi: f64) -> Self {
        if rsi < 30.0 {
            RsiZone::Oversold
        } else if rsi > 70.0 {
            RsiZone::Overbought
        } else {
            RsiZone::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRsi {
    pub symbol: String,
    pub rsi: Option<f64>,
    pub zone: Option<RsiZone>,
}

/// Market breadth proxy: RSI(14) of the two broad US indices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRsiReading {
    pub sp500: IndexRsi,
    pub nasdaq: IndexRsi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn between(latest: Option<f64>, previous: Option<f64>) -> Self {
        match (latest, previous) {
            (Some(l), Some(p)) if l < p => Trend::Down,
            (Some(_), Some(_)) => Trend::Up,
            _ => Trend::Flat,
        }
    }
}

/// Monthly macro series pulled from a statistics provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MacroSeries {
    /// Consumer price index, all urban consumers
    Cpi,
    /// M2 money stock, seasonally adjusted
    M2,
}

impl MacroSeries {
    pub fn series_id(&self) -> &'static str {
        match self {
            MacroSeries::Cpi => "CPIAUCSL",
            MacroSeries::M2 => "M2SL",
        }
    }
}

/// `value` is `None` where the provider publishes a placeholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflationReading {
    pub latest_yoy_pct: Option<f64>,
    pub previous_yoy_pct: Option<f64>,
    pub latest_date: NaiveDate,
    pub trend: Trend,
    /// Index levels, newest first, at most 12
    pub history: Vec<Observation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityLevel {
    Excess,
    Expanding,
    Neutral,
    Contracting,
    SeverelyContracting,
}

impl LiquidityLevel {
    pub fn classify(yoy_pct: f64) -> Self {
        if yoy_pct >= 15.0 {
            LiquidityLevel::Excess
        } else if yoy_pct >= 7.0 {
            LiquidityLevel::Expanding
        } else if yoy_pct >= 0.0 {
            LiquidityLevel::Neutral
        } else if yoy_pct >= -2.0 {
            LiquidityLevel::Contracting
        } else {
            LiquidityLevel::SeverelyContracting
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoyPoint {
    pub date: NaiveDate,
    pub yoy_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneySupplyReading {
    pub latest_yoy_pct: Option<f64>,
    pub previous_yoy_pct: Option<f64>,
    pub latest_date: NaiveDate,
    pub trend: Trend,
    pub level: Option<LiquidityLevel>,
    pub consecutive_months: u32,
    /// Newest first, at most 12
    pub history: Vec<YoyPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldCurveStatus {
    Normal,
    Flat,
    Inverted,
    DeeplyInverted,
}

impl YieldCurveStatus {
    pub fn classify(spread: f64) -> Self {
        if spread > 0.5 {
            YieldCurveStatus::Normal
        } else if spread > 0.0 {
            YieldCurveStatus::Flat
        } else if spread > -0.5 {
            YieldCurveStatus::Inverted
        } else {
            YieldCurveStatus::DeeplyInverted
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            YieldCurveStatus::Normal => "normal",
            YieldCurveStatus::Flat => "flat",
            YieldCurveStatus::Inverted => "inverted",
            YieldCurveStatus::DeeplyInverted => "deeply inverted",
        }
    }
}

/// Long and short treasury yields in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreasuryRates {
    pub long_rate: f64,
    pub short_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldCurveReading {
    pub spread: f64,
    pub long_rate: f64,
    pub short_rate: f64,
    pub status: YieldCurveStatus,
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fear_greed_bands() {
        assert_eq!(FearGreedLabel::classify(10.0), FearGreedLabel::ExtremeFear);
        assert_eq!(FearGreedLabel::classify(25.0), FearGreedLabel::ExtremeFear);
        assert_eq!(FearGreedLabel::classify(45.0), FearGreedLabel::Fear);
        assert_eq!(FearGreedLabel::classify(50.0), FearGreedLabel::Neutral);
        assert_eq!(FearGreedLabel::classify(75.0), FearGreedLabel::Greed);
        assert_eq!(FearGreedLabel::classify(90.0).name(), "Extreme Greed");
    }

    #[test]
    fn test_yield_curve_status() {
        assert_eq!(YieldCurveStatus::classify(0.6), YieldCurveStatus::Normal);
        assert_eq!(YieldCurveStatus::classify(0.5), YieldCurveStatus::Flat);
        assert_eq!(YieldCurveStatus::classify(0.0), YieldCurveStatus::Inverted);
        assert_eq!(YieldCurveStatus::classify(-0.5), YieldCurveStatus::DeeplyInverted);
    }

    #[test]
    fn test_liquidity_levels() {
        assert_eq!(LiquidityLevel::classify(16.0), LiquidityLevel::Excess);
        assert_eq!(LiquidityLevel::classify(7.0), LiquidityLevel::Expanding);
        assert_eq!(LiquidityLevel::classify(0.0), LiquidityLevel::Neutral);
        assert_eq!(LiquidityLevel::classify(-2.0), LiquidityLevel::Contracting);
        assert_eq!(LiquidityLevel::classify(-2.1), LiquidityLevel::SeverelyContracting);
    }

    #[test]
    fn test_trend() {
        assert_eq!(Trend::between(Some(2.0), Some(3.0)), Trend::Down);
        assert_eq!(Trend::between(Some(3.0), Some(3.0)), Trend::Up);
        assert_eq!(Trend::between(Some(3.0), None), Trend::Flat);
    }

    #[test]
    fn test_vix_and_rsi_zones() {
        assert_eq!(VixLevel::classify(14.9), VixLevel::Low);
        assert_eq!(VixLevel::classify(24.0), VixLevel::Normal);
        assert_eq!(VixLevel::classify(34.0), VixLevel::High);
        assert_eq!(VixLevel::classify(40.0), VixLevel::Extreme);
        assert_eq!(RsiZone::classify(29.0), RsiZone::Oversold);
        assert_eq!(RsiZone::classify(70.0), RsiZone::Neutral);
        assert_eq!(RsiZone::classify(71.0), RsiZone::Overbought);
    }
}
