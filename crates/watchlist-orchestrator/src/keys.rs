use serde::{Deserialize, Serialize};

/// Cache key class. TTL is chosen per class, not per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalClass {
    FearGreed,
    Volatility,
    MarketRsi,
    Inflation,
    MoneySupply,
    YieldCurve,
    /// Per-symbol fundamentals and history
    Stock,
    /// Per-symbol live quote
    Price,
}

impl SignalClass {
    /// Key for market-wide classes; per-symbol classes use [`symbol_key`]
    pub fn key(&self) -> &'static str {
        match self {
            SignalClass::FearGreed => "fear_greed",
            SignalClass::Volatility => "vix",
            SignalClass::MarketRsi => "market_rsi",
            SignalClass::Inflation => "cpi",
            SignalClass::MoneySupply => "m2",
            SignalClass::YieldCurve => "yield_curve",
            SignalClass::Stock => "stock",
            SignalClass::Price => "price",
        }
    }
}

pub fn symbol_key(class: SignalClass, symbol: &str) -> String {
    format!("{}:{}", class.key(), symbol)
}

/// Trimmed, upper-cased ticker
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}
