//! Macro-regime adjustments applied after the weighted blend.

/// 0-25 points subtracted as the yield curve flattens and inverts
pub fn recession_penalty(yield_spread: Option<f64>) -> u32 {
    match yield_spread.filter(|s| s.is_finite()) {
        Some(s) if s > 0.5 => 0,
        Some(s) if s > 0.0 => 5,
        Some(s) if s > -0.5 => 15,
        Some(_) => 25,
        None => 0,
    }
}

/// Base points for a money-supply YoY growth bracket
fn liquidity_base(growth_pct: f64) -> i32 {
    if growth_pct >= 15.0 {
        10
    } else if growth_pct >= 7.0 {
        5
    } else if growth_pct >= 0.0 {
        0
    } else if growth_pct >= -2.0 {
        -7
    } else {
        -15
    }
}

/// How much of the liquidity signal has reached equity prices after
/// `months` in the current regime. Zero months counts as the first bucket.
pub fn lag_weight(contracting: bool, months: u32) -> f64 {
    if contracting {
        match months {
            0..=3 => 0.3,
            4..=6 => 0.6,
            7..=12 => 1.0,
            _ => 0.7,
        }
    } else {
        match months {
            0..=3 => 0.4,
            4..=9 => 0.8,
            _ => 0.4,
        }
    }
}

/// -15..=+10, lag-weighted and rounded half away from zero
pub fn liquidity_adjustment(growth_pct: Option<f64>, consecutive_months: u32) -> i32 {
    let growth = match growth_pct {
        Some(g) if g.is_finite() => g,
        _ => return 0,
    };
    let base = liquidity_base(growth);
    if base == 0 {
        return 0;
    }
    (base as f64 * lag_weight(base < 0, consecutive_months)).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recession_steps() {
        assert_eq!(recession_penalty(Some(0.6)), 0);
        assert_eq!(recession_penalty(Some(0.3)), 5);
        assert_eq!(recession_penalty(Some(-0.2)), 15);
        assert_eq!(recession_penalty(Some(-0.9)), 25);
        assert_eq!(recession_penalty(None), 0);
    }

    #[test]
    fn test_recession_monotonic() {
        let mut last = 0;
        for hundredths in (-200..=200).rev() {
            let p = recession_penalty(Some(hundredths as f64 / 100.0));
            assert!(p >= last);
            last = p;
        }
    }

    #[test]
    fn test_liquidity_examples() {
        assert_eq!(liquidity_adjustment(Some(16.0), 2), 4);
        assert_eq!(liquidity_adjustment(Some(-3.0), 9), -15);
        for months in 0..30 {
            assert_eq!(liquidity_adjustment(Some(3.0), months), 0);
        }
    }

    #[test]
    fn test_liquidity_lag_curve() {
        // contraction peaks in months 7-12
        assert_eq!(liquidity_adjustment(Some(-1.0), 2), -2);
        assert_eq!(liquidity_adjustment(Some(-1.0), 5), -4);
        assert_eq!(liquidity_adjustment(Some(-1.0), 10), -7);
        assert_eq!(liquidity_adjustment(Some(-1.0), 14), -5);
        // expansion fades once priced in
        assert_eq!(liquidity_adjustment(Some(8.0), 6), 4);
        assert_eq!(liquidity_adjustment(Some(20.0), 12), 4);
        assert_eq!(liquidity_adjustment(Some(20.0), 0), 4);
    }

    #[test]
    fn test_liquidity_range() {
        for tenths in -300..=300 {
            for months in 0..40 {
                let adj = liquidity_adjustment(Some(tenths as f64 / 10.0), months);
                assert!((-15..=10).contains(&adj));
            }
        }
        assert_eq!(liquidity_adjustment(None, 5), 0);
    }
}
