use watchlist_core::MaAlignment;

use crate::indicators::{macd, rsi};

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// RSI(14) of the latest session
pub fn latest_rsi(closes: &[f64]) -> Option<f64> {
    rsi(closes, RSI_PERIOD).last().copied()
}

/// MACD(12,26,9) line above its signal line on the latest session
pub fn macd_bullish(closes: &[f64]) -> Option<bool> {
    let result = macd(closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    result.histogram.last().map(|h| *h > 0.0)
}

/// Classifies price against a short and a long moving average
pub fn ma_alignment(price: f64, short_ma: Option<f64>, long_ma: Option<f64>) -> Option<MaAlignment> {
    let long_ma = long_ma?;
    let alignment = match short_ma {
        Some(short) if price > short && short > long_ma => MaAlignment::Bullish,
        Some(short) if short > long_ma => MaAlignment::Partial,
        _ if price > long_ma => MaAlignment::Partial,
        _ => MaAlignment::Bearish,
    };
    Some(alignment)
}
