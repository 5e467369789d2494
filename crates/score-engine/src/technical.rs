use watchlist_core::{MaAlignment, Technicals};

pub const MACD_BULLISH_POINTS: u32 = 30;

/// RSI (up to 40, oversold favoured) + MACD bullish (30) + MA alignment (up to 30)
pub fn technical_score(t: &Technicals) -> u32 {
    let rsi = match t.rsi.filter(|r| r.is_finite()) {
        Some(r) if r <= 30.0 => 40,
        Some(r) if r <= 40.0 => 30,
        Some(r) if r <= 50.0 => 20,
        Some(r) if r <= 60.0 => 10,
        _ => 0,
    };
    let macd = if t.macd_bullish == Some(true) { MACD_BULLISH_POINTS } else { 0 };
    let alignment = match t.ma_alignment {
        Some(MaAlignment::Bullish) => 30,
        Some(MaAlignment::Partial) => 15,
        _ => 0,
    };
    (rsi + macd + alignment).min(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_marks() {
        let t = Technicals {
            rsi: Some(28.0),
            macd_bullish: Some(true),
            ma_alignment: Some(MaAlignment::Bullish),
        };
        assert_eq!(technical_score(&t), 100);
    }

    #[test]
    fn test_rsi_ladder() {
        let score = |rsi| technical_score(&Technicals { rsi: Some(rsi), ..Default::default() });
        assert_eq!(score(30.0), 40);
        assert_eq!(score(35.0), 30);
        assert_eq!(score(45.0), 20);
        assert_eq!(score(55.0), 10);
        assert_eq!(score(65.0), 0);
        assert_eq!(score(80.0), 0);
    }

    #[test]
    fn test_partial_alignment_and_missing() {
        let t = Technicals {
            rsi: None,
            macd_bullish: Some(false),
            ma_alignment: Some(MaAlignment::Partial),
        };
        assert_eq!(technical_score(&t), 15);
        assert_eq!(technical_score(&Technicals::default()), 0);
    }
}
