use watchlist_core::{Fundamentals, SymbolSnapshot};

/// 0-100 for securities, `None` (not applicable) for funds
pub fn fundamental_score(snapshot: &SymbolSnapshot) -> Option<u32> {
    if snapshot.is_fund() {
        return None;
    }

    let f = &snapshot.fundamentals;
    let total = valuation_points(f)
        + buy_ratio_points(snapshot.analyst.buy_ratio_pct)
        + cash_flow_points(f.fcf_positive)
        + growth_points(f)
        + roe_points(f.roe_pct)
        + health_adjustment(f);

    Some(total.clamp(0, 100) as u32)
}

/// PEG when it is a usable positive number, forward P/E otherwise
fn valuation_points(f: &Fundamentals) -> i32 {
    if let Some(peg) = f.peg_ratio.filter(|p| p.is_finite() && *p > 0.0) {
        return match peg {
            p if p < 1.0 => 35,
            p if p < 1.5 => 28,
            p if p < 2.0 => 20,
            p if p < 3.0 => 10,
            _ => 0,
        };
    }
    match f.forward_pe.filter(|pe| pe.is_finite() && *pe > 0.0) {
        Some(pe) if pe < 15.0 => 35,
        Some(pe) if pe < 20.0 => 28,
        Some(pe) if pe < 25.0 => 20,
        Some(pe) if pe < 30.0 => 10,
        _ => 0,
    }
}

fn buy_ratio_points(buy_ratio_pct: Option<f64>) -> i32 {
    match buy_ratio_pct {
        Some(r) if r >= 70.0 => 40,
        Some(r) if r >= 50.0 => 20,
        Some(r) if r >= 30.0 => 10,
        _ => 0,
    }
}

fn cash_flow_points(fcf_positive: Option<bool>) -> i32 {
    if fcf_positive == Some(true) {
        30
    } else {
        0
    }
}

fn growth_points(f: &Fundamentals) -> i32 {
    let eps = match f.eps_growth_pct {
        Some(g) if g > 20.0 => 15,
        Some(g) if g > 10.0 => 10,
        _ => 0,
    };
    let revenue = match f.revenue_growth_pct {
        Some(g) if g > 10.0 => 5,
        _ => 0,
    };
    eps + revenue
}

fn roe_points(roe_pct: Option<f64>) -> i32 {
    match roe_pct {
        Some(r) if r > 20.0 => 15,
        Some(r) if r > 15.0 => 10,
        _ => 0,
    }
}

/// Leverage and liquidity: bonus when conservative, penalty when stretched
fn health_adjustment(f: &Fundamentals) -> i32 {
    let leverage = match f.debt_to_equity.filter(|d| d.is_finite() && *d >= 0.0) {
        Some(d) if d < 0.5 => 5,
        Some(d) if d > 2.0 => -10,
        _ => 0,
    };
    let liquidity = match f.current_ratio.filter(|c| c.is_finite() && *c >= 0.0) {
        Some(c) if c > 1.5 => 5,
        Some(c) if c < 1.0 => -5,
        _ => 0,
    };
    leverage + liquidity
}
