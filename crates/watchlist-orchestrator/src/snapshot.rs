use chrono::{DateTime, Utc};
use price_indicators::{latest_rsi, ma_alignment, macd_bullish, sma_aligned};
use watchlist_core::{
    AnalystConsensus, AssetClass, DailyBar, FetchError, FundMetrics, Fundamentals, PricePoint,
    SecurityProfile, SymbolSnapshot, Technicals,
};

use crate::round_to;

/// Sessions in the 52-week window and in the chart series
const TRADING_YEAR: usize = 252;

/// Derive a [`SymbolSnapshot`] from a provider profile. A profile without
/// any usable bar is a fetch failure.
pub fn build_snapshot(
    symbol: &str,
    profile: SecurityProfile,
    now: DateTime<Utc>,
) -> Result<SymbolSnapshot, FetchError> {
    let mut bars: Vec<DailyBar> = profile
        .bars
        .iter()
        .filter(|b| b.close.is_finite() && b.close > 0.0)
        .cloned()
        .collect();
    bars.sort_by_key(|b| b.date);

    let last_close = bars
        .last()
        .map(|b| b.close)
        .ok_or_else(|| FetchError::NoData(format!("no price history for {}", symbol)))?;

    let price = profile
        .regular_market_price
        .filter(|p| p.is_finite() && *p > 0.0)
        .unwrap_or(last_close);

    let (ath, ath_date) = bars
        .iter()
        .map(|b| (session_high(b), b.date))
        .fold((f64::MIN, None), |best, (high, date)| {
            if high > best.0 {
                (high, Some(date))
            } else {
                best
            }
        });
    let high_52w = bars[bars.len().saturating_sub(TRADING_YEAR)..]
        .iter()
        .map(session_high)
        .fold(f64::MIN, f64::max);

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ma20 = sma_aligned(&closes, 20);
    let ma60 = sma_aligned(&closes, 60);
    let ma120 = sma_aligned(&closes, 120);

    let start = bars.len().saturating_sub(TRADING_YEAR);
    let price_history = (start..bars.len())
        .map(|i| PricePoint {
            date: bars[i].date,
            close: round_to(bars[i].close, 2),
            volume: bars[i].volume,
            ma20: ma20[i].map(|v| round_to(v, 2)),
            ma60: ma60[i].map(|v| round_to(v, 2)),
            ma120: ma120[i].map(|v| round_to(v, 2)),
        })
        .collect();

    let technicals = Technicals {
        rsi: latest_rsi(&closes).map(|r| round_to(r, 1)),
        macd_bullish: macd_bullish(&closes),
        ma_alignment: ma_alignment(price, ma20.last().copied().flatten(), ma60.last().copied().flatten()),
    };

    let asset_class = match profile.quote_type.as_deref() {
        Some(t) if t.eq_ignore_ascii_case("ETF") || t.eq_ignore_ascii_case("MUTUALFUND") => AssetClass::Fund,
        _ => AssetClass::Security,
    };

    let pct = |fraction: Option<f64>| fraction.filter(|f| f.is_finite()).map(|f| round_to(f * 100.0, 1));
    let two_dp = |v: Option<f64>| v.filter(|x| x.is_finite()).map(|x| round_to(x, 2));

    let fundamentals = Fundamentals {
        forward_pe: two_dp(profile.forward_pe),
        trailing_pe: two_dp(profile.trailing_pe),
        peg_ratio: two_dp(profile.peg_ratio),
        fcf_positive: profile.free_cash_flow.filter(|f| f.is_finite()).map(|f| f > 0.0),
        eps_growth_pct: pct(profile.earnings_growth),
        revenue_growth_pct: pct(profile.revenue_growth),
        roe_pct: pct(profile.return_on_equity),
        debt_to_equity: two_dp(profile.debt_to_equity),
        current_ratio: two_dp(profile.current_ratio),
    };

    let target_price = two_dp(profile.target_mean_price).filter(|t| *t > 0.0);
    let analyst = AnalystConsensus {
        buy_ratio_pct: profile
            .recommendations
            .and_then(|r| r.buy_ratio_pct())
            .map(|r| round_to(r, 1)),
        analyst_count: profile
            .number_of_analysts
            .or_else(|| profile.recommendations.map(|r| r.total()).filter(|n| *n > 0)),
        target_price,
        target_upside_pct: target_price.map(|t| round_to((t - price) / price * 100.0, 1)),
    };

    let fund = FundMetrics {
        ytd_return_pct: pct(profile.ytd_return),
        three_year_return_pct: pct(profile.three_year_return),
        total_assets: profile.total_assets,
    };

    Ok(SymbolSnapshot {
        symbol: symbol.to_string(),
        name: profile.name,
        currency: profile.currency,
        sector: profile.sector,
        industry: profile.industry,
        asset_class,
        price: Some(round_to(price, 2)),
        ath: ath_date.map(|_| round_to(ath, 2)),
        ath_date,
        high_52w: Some(round_to(high_52w, 2)),
        ath_drawdown_pct: ath_date.map(|_| round_to((price - ath) / ath * 100.0, 1)),
        high_52w_drawdown_pct: Some(round_to((price - high_52w) / high_52w * 100.0, 1)),
        fundamentals,
        technicals,
        analyst,
        fund,
        price_history,
        updated_at: Some(now),
        stale: false,
        error: None,
    })
}

/// Intraday high, falling back to the close when the high is bogus
fn session_high(bar: &DailyBar) -> f64 {
    if bar.high.is_finite() && bar.high >= bar.close {
        bar.high
    } else {
        bar.close
    }
}
