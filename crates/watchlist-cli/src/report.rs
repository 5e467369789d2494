use std::fmt::Write;

use watchlist_core::{PriceQuote, RankedSymbol};
use watchlist_orchestrator::{FetchOutcome, MacroDashboard};

fn opt(value: Option<f64>, suffix: &str) -> String {
    value.map(|v| format!("{:.1}{}", v, suffix)).unwrap_or_else(|| "-".to_string())
}

fn provenance<T>(outcome: &FetchOutcome<T>) -> String {
    match outcome {
        FetchOutcome::Cached { .. } => "cached".to_string(),
        FetchOutcome::Fetched { provider, .. } => format!("live: {}", provider),
        FetchOutcome::Stale { .. } => "STALE".to_string(),
        FetchOutcome::Unavailable { reason } => format!("unavailable: {}", reason),
    }
}

pub fn ranking_table(ranked: &[RankedSymbol]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<4} {:<8} {:>10} {:>8} {:>6}  {:<14} {}",
        "#", "SYMBOL", "PRICE", "ATH DD", "SCORE", "GRADE", "REASONS"
    );
    for (i, entry) in ranked.iter().enumerate() {
        let snap = &entry.snapshot;
        let reasons = match &snap.error {
            Some(err) => format!("unavailable ({})", err),
            None if snap.stale => format!("[stale] {}", entry.score.summary()),
            None => entry.score.summary(),
        };
        let _ = writeln!(
            out,
            "{:<4} {:<8} {:>10} {:>8} {:>6}  {:<14} {}",
            i + 1,
            snap.symbol,
            snap.price.map(|p| format!("{:.2}", p)).unwrap_or_else(|| "-".to_string()),
            opt(snap.ath_drawdown_pct, "%"),
            entry.score.total_score,
            entry.score.grade.label(),
            reasons
        );
    }
    out
}

pub fn dashboard_text(dashboard: &MacroDashboard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Composite fear score: {}/100", dashboard.fear_score);

    match dashboard.fear_greed.value() {
        Some(r) => {
            let _ = writeln!(out, "Fear & greed:  {:.0} ({})", r.value, r.label().name());
        }
        None => {
            let _ = writeln!(out, "Fear & greed:  -");
        }
    }
    let _ = writeln!(out, "               [{}]", provenance(&dashboard.fear_greed));

    match dashboard.vix.value() {
        Some(r) => {
            let _ = writeln!(out, "VIX:           {:.2} {:?} (chg {})", r.current, r.level, opt(r.change_pct, "%"));
        }
        None => {
            let _ = writeln!(out, "VIX:           -");
        }
    }
    let _ = writeln!(out, "               [{}]", provenance(&dashboard.vix));

    match dashboard.market_rsi.value() {
        Some(r) => {
            let _ = writeln!(out, "RSI S&P/NDX:   {} / {}", opt(r.sp500.rsi, ""), opt(r.nasdaq.rsi, ""));
        }
        None => {
            let _ = writeln!(out, "RSI S&P/NDX:   -");
        }
    }
    let _ = writeln!(out, "               [{}]", provenance(&dashboard.market_rsi));

    match dashboard.inflation.value() {
        Some(r) => {
            let _ = writeln!(out, "CPI YoY:       {} {:?} ({})", opt(r.latest_yoy_pct, "%"), r.trend, r.latest_date);
        }
        None => {
            let _ = writeln!(out, "CPI YoY:       -");
        }
    }
    let _ = writeln!(out, "               [{}]", provenance(&dashboard.inflation));

    match dashboard.money_supply.value() {
        Some(r) => {
            let _ = writeln!(
                out,
                "M2 YoY:        {} {:?}, {} months in regime",
                opt(r.latest_yoy_pct, "%"),
                r.trend,
                r.consecutive_months
            );
        }
        None => {
            let _ = writeln!(out, "M2 YoY:        -");
        }
    }
    let _ = writeln!(out, "               [{}]", provenance(&dashboard.money_supply));

    match dashboard.yield_curve.value() {
        Some(r) => {
            let _ = writeln!(out, "10y-2y spread: {:+.3} ({})", r.spread, r.status.name());
        }
        None => {
            let _ = writeln!(out, "10y-2y spread: -");
        }
    }
    let _ = writeln!(out, "               [{}]", provenance(&dashboard.yield_curve));
    out
}

pub fn prices_text(prices: &[PriceQuote]) -> String {
    prices
        .iter()
        .map(|q| {
            let price = q.price.map(|p| format!("{:.2}", p)).unwrap_or_else(|| "-".to_string());
            let change = q.change_pct.map(|c| format!("{:+.2}%", c)).unwrap_or_else(|| "-".to_string());
            format!("{:<8} {:>10} {:>8}\n", q.symbol, price, change)
        })
        .collect()
}
