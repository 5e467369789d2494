use watchlist_core::AssetClass;

/// (minimum |drawdown| %, points), checked top-down
const SECURITY_BANDS: [(f64, u32); 4] = [(50.0, 100), (30.0, 75), (20.0, 50), (10.0, 25)];
const FUND_BANDS: [(f64, u32); 4] = [(20.0, 100), (15.0, 75), (10.0, 50), (5.0, 25)];

/// 0-100, higher for deeper drawdowns. Funds use tighter bands.
pub fn drawdown_score(drawdown_pct: Option<f64>, asset_class: AssetClass) -> u32 {
    let depth = match drawdown_pct {
        Some(dd) if dd.is_finite() => dd.abs(),
        _ => return 0,
    };
    let bands = match asset_class {
        AssetClass::Security => &SECURITY_BANDS,
        AssetClass::Fund => &FUND_BANDS,
    };
    bands
        .iter()
        .find(|(threshold, _)| depth >= *threshold)
        .map(|(_, points)| *points)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_bands() {
        assert_eq!(drawdown_score(Some(-55.0), AssetClass::Security), 100);
        assert_eq!(drawdown_score(Some(-30.0), AssetClass::Security), 75);
        assert_eq!(drawdown_score(Some(-20.0), AssetClass::Security), 50);
        assert_eq!(drawdown_score(Some(-12.0), AssetClass::Security), 25);
        assert_eq!(drawdown_score(Some(-3.0), AssetClass::Security), 0);
    }

    #[test]
    fn test_fund_bands() {
        assert_eq!(drawdown_score(Some(-22.0), AssetClass::Fund), 100);
        assert_eq!(drawdown_score(Some(-15.0), AssetClass::Fund), 75);
        assert_eq!(drawdown_score(Some(-10.0), AssetClass::Fund), 50);
        assert_eq!(drawdown_score(Some(-7.0), AssetClass::Fund), 25);
        assert_eq!(drawdown_score(Some(-4.9), AssetClass::Fund), 0);
    }

    #[test]
    fn test_missing_or_invalid() {
        assert_eq!(drawdown_score(None, AssetClass::Security), 0);
        assert_eq!(drawdown_score(Some(f64::NAN), AssetClass::Fund), 0);
    }

    #[test]
    fn test_monotonic_in_depth() {
        for class in [AssetClass::Security, AssetClass::Fund] {
            let mut last = 0;
            for tenths in 0..=800 {
                let score = drawdown_score(Some(-(tenths as f64) / 10.0), class);
                assert!(score >= last, "{:?} dropped at -{}%", class, tenths as f64 / 10.0);
                last = score;
            }
        }
    }
}
