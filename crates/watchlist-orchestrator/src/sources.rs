use std::sync::Arc;

use watchlist_core::{MacroSeriesSource, MarketHistorySource, RatesSource, SecuritySource, SentimentSource};

/// Providers per signal, in fallback order (primary first)
#[derive(Clone, Default)]
pub struct SignalSources {
    pub sentiment: Vec<Arc<dyn SentimentSource>>,
    pub market_history: Vec<Arc<dyn MarketHistorySource>>,
    pub macro_series: Vec<Arc<dyn MacroSeriesSource>>,
    pub rates: Vec<Arc<dyn RatesSource>>,
    pub securities: Vec<Arc<dyn SecuritySource>>,
}

impl SignalSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sentiment(mut self, source: Arc<dyn SentimentSource>) -> Self {
        self.sentiment.push(source);
        self
    }

    pub fn with_market_history(mut self, source: Arc<dyn MarketHistorySource>) -> Self {
        self.market_history.push(source);
        self
    }

    pub fn with_macro_series(mut self, source: Arc<dyn MacroSeriesSource>) -> Self {
        self.macro_series.push(source);
        self
    }

    pub fn with_rates(mut self, source: Arc<dyn RatesSource>) -> Self {
        self.rates.push(source);
        self
    }

    pub fn with_securities(mut self, source: Arc<dyn SecuritySource>) -> Self {
        self.securities.push(source);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sentiment.is_empty()
            && self.market_history.is_empty()
            && self.macro_series.is_empty()
            && self.rates.is_empty()
            && self.securities.is_empty()
    }
}
