/// Composite market fear, 0-100, from three independent gauges.
///
/// Fear & greed contributes up to 40 (low readings = fear), VIX up to 35 and
/// the S&P 500 RSI up to 25 (oversold = fear). Missing gauges contribute 0.
pub fn composite_fear_score(fear_greed: Option<f64>, vix: Option<f64>, sp500_rsi: Option<f64>) -> u32 {
    let sentiment = match fear_greed.filter(|v| v.is_finite()) {
        Some(v) if v <= 20.0 => 40,
        Some(v) if v <= 30.0 => 32,
        Some(v) if v <= 40.0 => 22,
        Some(v) if v <= 50.0 => 10,
        _ => 0,
    };
    let volatility = match vix.filter(|v| v.is_finite()) {
        Some(v) if v >= 35.0 => 35,
        Some(v) if v >= 28.0 => 25,
        Some(v) if v >= 23.0 => 15,
        Some(v) if v >= 20.0 => 5,
        _ => 0,
    };
    let momentum = match sp500_rsi.filter(|v| v.is_finite()) {
        Some(r) if r <= 30.0 => 25,
        Some(r) if r <= 38.0 => 20,
        Some(r) if r <= 45.0 => 12,
        Some(r) if r <= 50.0 => 5,
        _ => 0,
    };
    (sentiment + volatility + momentum).min(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_maxes_out() {
        assert_eq!(composite_fear_score(Some(8.0), Some(45.0), Some(22.0)), 100);
    }

    #[test]
    fn test_calm_market_is_zero() {
        assert_eq!(composite_fear_score(Some(70.0), Some(13.0), Some(62.0)), 0);
    }

    #[test]
    fn test_partial_inputs() {
        assert_eq!(composite_fear_score(Some(35.0), None, None), 22);
        assert_eq!(composite_fear_score(None, Some(29.0), Some(44.0)), 37);
        assert_eq!(composite_fear_score(None, None, None), 0);
    }
}
