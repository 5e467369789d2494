use watchlist_core::{MacroContext, SymbolSnapshot};

/// Fixed priority: fear regime, drawdown, analyst/fund return, recession
/// tier, liquidity tier. Display order is evaluation order.
pub(crate) fn build_reasons(
    ctx: &MacroContext,
    snapshot: &SymbolSnapshot,
    drawdown_score: u32,
    recession_penalty: u32,
    liquidity_adjustment: i32,
) -> Vec<String> {
    let mut reasons = Vec::new();

    if ctx.fear_score >= 60 {
        reasons.push("market fear zone".to_string());
    } else if ctx.fear_score >= 40 {
        reasons.push("market unease zone".to_string());
    }

    if drawdown_score > 0 {
        if let Some(dd) = snapshot.ath_drawdown_pct {
            reasons.push(format!("ATH {:.1}%", dd));
        }
    }

    if snapshot.is_fund() {
        if let Some(ret) = snapshot.fund.three_year_return_pct.filter(|r| *r > 0.0) {
            reasons.push(format!("3y return {:.1}%", ret));
        }
    } else if let Some(ratio) = snapshot.analyst.buy_ratio_pct.filter(|r| *r >= 50.0) {
        reasons.push(format!("buy ratio {:.0}%", ratio));
    }

    match recession_penalty {
        25 => reasons.push("yield curve deeply inverted (-25)".to_string()),
        15 => reasons.push("yield curve inverted (-15)".to_string()),
        5 => reasons.push("yield curve flat (-5)".to_string()),
        _ => {}
    }

    if liquidity_adjustment > 0 {
        reasons.push(format!("liquidity tailwind (+{})", liquidity_adjustment));
    } else if liquidity_adjustment <= -10 {
        reasons.push(format!("severe liquidity drain ({})", liquidity_adjustment));
    } else if liquidity_adjustment < 0 {
        reasons.push(format!("liquidity headwind ({})", liquidity_adjustment));
    }

    reasons
}
