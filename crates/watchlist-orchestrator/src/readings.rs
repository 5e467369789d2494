//! Turn raw provider series into the cached macro readings.

use chrono::NaiveDate;
use price_indicators::latest_rsi;
use watchlist_core::{
    DailyClose, FetchError, IndexRsi, InflationReading, LiquidityLevel, MarketRsiReading,
    MoneySupplyReading, Observation, RsiZone, TreasuryRates, Trend, VixLevel, VixReading,
    YieldCurveReading, YieldCurveStatus, YoyPoint,
};

use crate::round_to;

pub const VIX_SYMBOL: &str = "^VIX";
pub const SP500_SYMBOL: &str = "^GSPC";
pub const NASDAQ_SYMBOL: &str = "^IXIC";

/// YoY needs the same month one year back
const YOY_LAG: usize = 12;
/// M2 regime history kept for the consecutive-month count
const MAX_YOY_POINTS: usize = 14;
const HISTORY_LEN: usize = 12;
const VIX_HISTORY_LEN: usize = 20;

pub fn vix_reading(closes: &[DailyClose]) -> Result<VixReading, FetchError> {
    let latest = closes
        .last()
        .ok_or_else(|| FetchError::NoData(format!("{} history empty", VIX_SYMBOL)))?;
    let current = latest.close;
    let previous = closes.len().checked_sub(2).map(|i| closes[i].close);
    let change_pct = previous
        .filter(|p| *p != 0.0)
        .map(|p| round_to((current - p) / p * 100.0, 2));

    Ok(VixReading {
        current: round_to(current, 2),
        previous: previous.map(|p| round_to(p, 2)),
        change_pct,
        level: VixLevel::classify(current),
        history: closes[closes.len().saturating_sub(VIX_HISTORY_LEN)..].to_vec(),
    })
}

pub fn index_rsi(symbol: &str, closes: &[DailyClose]) -> IndexRsi {
    let values: Vec<f64> = closes.iter().map(|c| c.close).collect();
    let rsi = latest_rsi(&values).map(|r| round_to(r, 1));
    IndexRsi {
        symbol: symbol.to_string(),
        rsi,
        zone: rsi.map(RsiZone::classify),
    }
}

/// Fails only when neither index produced a value
pub fn market_rsi_reading(sp500: IndexRsi, nasdaq: IndexRsi) -> Result<MarketRsiReading, FetchError> {
    if sp500.rsi.is_none() && nasdaq.rsi.is_none() {
        return Err(FetchError::NoData("no index history long enough for RSI".to_string()));
    }
    Ok(MarketRsiReading { sp500, nasdaq })
}

/// Usable level observations, newest first
fn levels_newest_first(observations: &[Observation]) -> Vec<(NaiveDate, f64)> {
    let mut levels: Vec<(NaiveDate, f64)> = observations
        .iter()
        .filter_map(|o| o.value.filter(|v| v.is_finite() && *v > 0.0).map(|v| (o.date, v)))
        .collect();
    levels.sort_by(|a, b| b.0.cmp(&a.0));
    levels
}

fn yoy_at(levels: &[(NaiveDate, f64)], i: usize) -> Option<f64> {
    let current = levels.get(i)?.1;
    let year_ago = levels.get(i + YOY_LAG)?.1;
    Some(round_to((current / year_ago - 1.0) * 100.0, 2))
}

pub fn inflation_reading(observations: &[Observation]) -> Result<InflationReading, FetchError> {
    let levels = levels_newest_first(observations);
    let latest_date = levels
        .first()
        .map(|(date, _)| *date)
        .ok_or_else(|| FetchError::NoData("CPI series empty".to_string()))?;

    let latest_yoy_pct = yoy_at(&levels, 0);
    let previous_yoy_pct = yoy_at(&levels, 1);

    Ok(InflationReading {
        latest_yoy_pct,
        previous_yoy_pct,
        latest_date,
        trend: Trend::between(latest_yoy_pct, previous_yoy_pct),
        history: levels
            .iter()
            .take(HISTORY_LEN)
            .map(|(date, v)| Observation {
                date: *date,
                value: Some(round_to(*v, 2)),
            })
            .collect(),
    })
}

/// Up to 14 YoY growth points, newest first
pub fn yoy_series(observations: &[Observation]) -> Vec<YoyPoint> {
    let levels = levels_newest_first(observations);
    let points = levels.len().saturating_sub(YOY_LAG).min(MAX_YOY_POINTS);
    (0..points)
        .filter_map(|i| {
            yoy_at(&levels, i).map(|yoy_pct| YoyPoint {
                date: levels[i].0,
                yoy_pct,
            })
        })
        .collect()
}

/// Leading points that share the latest point's regime (contraction when
/// negative, expansion otherwise)
pub fn consecutive_regime_months(yoy: &[YoyPoint]) -> u32 {
    let Some(latest) = yoy.first() else {
        return 0;
    };
    let contracting = latest.yoy_pct < 0.0;
    yoy.iter()
        .take_while(|p| (p.yoy_pct < 0.0) == contracting)
        .count() as u32
}

pub fn money_supply_reading(observations: &[Observation]) -> Result<MoneySupplyReading, FetchError> {
    let yoy = yoy_series(observations);
    let latest = yoy
        .first()
        .ok_or_else(|| FetchError::NoData("M2 series shorter than 13 months".to_string()))?;

    let latest_yoy_pct = Some(latest.yoy_pct);
    let previous_yoy_pct = yoy.get(1).map(|p| p.yoy_pct);

    Ok(MoneySupplyReading {
        latest_yoy_pct,
        previous_yoy_pct,
        latest_date: latest.date,
        trend: Trend::between(latest_yoy_pct, previous_yoy_pct),
        level: latest_yoy_pct.map(LiquidityLevel::classify),
        consecutive_months: consecutive_regime_months(&yoy),
        history: yoy.iter().take(HISTORY_LEN).cloned().collect(),
    })
}

pub fn yield_curve_reading(rates: TreasuryRates, source: &str) -> Result<YieldCurveReading, FetchError> {
    if !rates.long_rate.is_finite() || !rates.short_rate.is_finite() {
        return Err(FetchError::Malformed(format!("non-numeric treasury yields from {}", source)));
    }
    let spread = round_to(rates.long_rate - rates.short_rate, 3);
    Ok(YieldCurveReading {
        spread,
        long_rate: round_to(rates.long_rate, 3),
        short_rate: round_to(rates.short_rate, 3),
        status: YieldCurveStatus::classify(spread),
        source: source.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(i: u32) -> NaiveDate {
        // i months before 2026-09-01
        let total = 2026 * 12 + 8 - i as i32;
        NaiveDate::from_ymd_opt(total / 12, (total % 12) as u32 + 1, 1).unwrap()
    }

    /// Levels newest first; each month's level is derived from a YoY path
    fn series(levels: &[f64]) -> Vec<Observation> {
        levels
            .iter()
            .enumerate()
            .map(|(i, v)| Observation {
                date: month(i as u32),
                value: Some(*v),
            })
            .collect()
    }

    #[test]
    fn test_yoy_series_and_regime_count() {
        // 26 months: the newest 3 are 3% below a year earlier, the rest flat at 100
        let mut levels = vec![97.0, 97.0, 97.0];
        levels.extend(std::iter::repeat(100.0).take(23));
        let obs = series(&levels);

        let yoy = yoy_series(&obs);
        assert_eq!(yoy.len(), 14);
        assert_eq!(yoy[0].yoy_pct, -3.0);
        assert_eq!(yoy[0].date, month(0));
        assert_eq!(yoy[3].yoy_pct, 0.0);
        assert_eq!(consecutive_regime_months(&yoy), 3);

        let reading = money_supply_reading(&obs).unwrap();
        assert_eq!(reading.latest_yoy_pct, Some(-3.0));
        assert_eq!(reading.level, Some(LiquidityLevel::SeverelyContracting));
        assert_eq!(reading.consecutive_months, 3);
        assert_eq!(reading.history.len(), 12);
    }

    #[test]
    fn test_expansion_regime_counts_non_negative() {
        let yoy: Vec<YoyPoint> = [4.0, 0.0, 2.0, -1.0, 5.0]
            .iter()
            .enumerate()
            .map(|(i, v)| YoyPoint { date: month(i as u32), yoy_pct: *v })
            .collect();
        assert_eq!(consecutive_regime_months(&yoy), 3);
        assert_eq!(consecutive_regime_months(&[]), 0);
    }

    #[test]
    fn test_placeholders_skipped_and_order_normalised() {
        let mut obs = series(&[110.0, 109.0, 108.0, 107.0, 106.0, 105.0, 104.0, 103.0, 102.0, 101.0, 100.0, 100.0, 100.0, 100.0]);
        obs.insert(2, Observation { date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(), value: None });
        obs.reverse();

        let reading = inflation_reading(&obs).unwrap();
        assert_eq!(reading.latest_date, month(0));
        assert_eq!(reading.latest_yoy_pct, Some(10.0));
        assert_eq!(reading.previous_yoy_pct, Some(9.0));
        assert_eq!(reading.trend, Trend::Up);
        assert_eq!(reading.history.len(), 12);
    }

    #[test]
    fn test_short_series() {
        assert!(money_supply_reading(&series(&[100.0; 12])).is_err());
        let cpi = inflation_reading(&series(&[100.0; 5])).unwrap();
        assert_eq!(cpi.latest_yoy_pct, None);
        assert_eq!(cpi.trend, Trend::Flat);
        assert!(inflation_reading(&[]).is_err());
    }

    #[test]
    fn test_yield_curve_reading() {
        let reading = yield_curve_reading(TreasuryRates { long_rate: 4.21, short_rate: 4.656 }, "fred").unwrap();
        assert_eq!(reading.spread, -0.446);
        assert_eq!(reading.status, YieldCurveStatus::Inverted);
        assert_eq!(reading.source, "fred");

        let bad = TreasuryRates { long_rate: f64::NAN, short_rate: 4.0 };
        assert!(yield_curve_reading(bad, "fred").is_err());
    }

    #[test]
    fn test_vix_reading() {
        let closes: Vec<DailyClose> = (0..30)
            .map(|i| DailyClose {
                date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap() + chrono::Duration::days(i),
                close: 20.0 + i as f64 * 0.5,
            })
            .collect();
        let reading = vix_reading(&closes).unwrap();
        assert_eq!(reading.current, 34.5);
        assert_eq!(reading.previous, Some(34.0));
        assert_eq!(reading.change_pct, Some(1.47));
        assert_eq!(reading.level, VixLevel::High);
        assert_eq!(reading.history.len(), 20);
        assert!(vix_reading(&[]).is_err());
    }

    #[test]
    fn test_market_rsi_needs_one_index() {
        let short = index_rsi(SP500_SYMBOL, &[]);
        assert_eq!(short.rsi, None);
        assert!(market_rsi_reading(short.clone(), index_rsi(NASDAQ_SYMBOL, &[])).is_err());

        let closes: Vec<DailyClose> = (0..40)
            .map(|i| DailyClose {
                date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + chrono::Duration::days(i),
                close: 5000.0 - i as f64 * 10.0,
            })
            .collect();
        let nasdaq = index_rsi(NASDAQ_SYMBOL, &closes);
        assert_eq!(nasdaq.zone, Some(RsiZone::Oversold));
        let reading = market_rsi_reading(short, nasdaq).unwrap();
        assert_eq!(reading.sp500.rsi, None);
    }
}
