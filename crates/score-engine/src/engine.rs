use serde::{Deserialize, Serialize};
use watchlist_core::{Grade, MacroContext, ScoreResult, SymbolSnapshot};

use crate::reasons::build_reasons;
use crate::{drawdown_score, fundamental_score, liquidity_adjustment, recession_penalty, technical_score};

/// Blend weights for the sub-scores. Each set sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendWeights {
    pub fear: f64,
    pub drawdown: f64,
    /// Ignored for funds
    pub fundamental: f64,
    pub technical: f64,
}

impl BlendWeights {
    pub fn security() -> Self {
        Self {
            fear: 0.25,
            drawdown: 0.30,
            fundamental: 0.25,
            technical: 0.20,
        }
    }

    pub fn fund() -> Self {
        Self {
            fear: 0.35,
            drawdown: 0.35,
            fundamental: 0.0,
            technical: 0.30,
        }
    }
}

/// Stateless scorer; the same inputs always yield the same [`ScoreResult`]
#[derive(Debug, Clone)]
pub struct ScoreEngine {
    security_weights: BlendWeights,
    fund_weights: BlendWeights,
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreEngine {
    pub fn new() -> Self {
        Self {
            security_weights: BlendWeights::security(),
            fund_weights: BlendWeights::fund(),
        }
    }

    pub fn with_weights(security_weights: BlendWeights, fund_weights: BlendWeights) -> Self {
        Self {
            security_weights,
            fund_weights,
        }
    }

    pub fn score(&self, ctx: &MacroContext, snapshot: &SymbolSnapshot) -> ScoreResult {
        let fear = ctx.fear_score.min(100);
        let drawdown = drawdown_score(snapshot.ath_drawdown_pct, snapshot.asset_class);
        let fundamental = fundamental_score(snapshot);
        let technical = technical_score(&snapshot.technicals);

        let blended = match fundamental {
            Some(fundamental) => {
                let w = &self.security_weights;
                w.fear * fear as f64
                    + w.drawdown * drawdown as f64
                    + w.fundamental * fundamental as f64
                    + w.technical * technical as f64
            }
            None => {
                let w = &self.fund_weights;
                w.fear * fear as f64 + w.drawdown * drawdown as f64 + w.technical * technical as f64
            }
        };
        let combined = blended.round() as i32;

        let penalty = recession_penalty(ctx.yield_spread);
        let liquidity = liquidity_adjustment(ctx.m2_yoy_pct, ctx.m2_consecutive_months);
        let total = (combined - penalty as i32 + liquidity).clamp(0, 100) as u32;

        tracing::debug!(
            "Scored {}: combined={} penalty={} liquidity={} total={}",
            snapshot.symbol,
            combined,
            penalty,
            liquidity,
            total
        );

        ScoreResult {
            fear_score: fear,
            drawdown_score: drawdown,
            fundamental_score: fundamental,
            technical_score: technical,
            recession_penalty: penalty,
            liquidity_adjustment: liquidity,
            combined_score: combined,
            total_score: total,
            grade: Grade::from_score(total),
            reasons: build_reasons(ctx, snapshot, drawdown, penalty, liquidity),
        }
    }
}
