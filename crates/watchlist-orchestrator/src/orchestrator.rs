use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use score_engine::{composite_fear_score, ScoreEngine};
use serde::Serialize;
use tiered_cache::{CacheError, TieredCache};
use tokio::sync::Semaphore;
use watchlist_core::{
    FearGreedReading, IndexRsi, InflationReading, LiveQuote, MacroContext, MacroSeries, MarketHistorySource,
    MarketRsiReading, MoneySupplyReading, PriceQuote, RankedSymbol, ScoreResult, SymbolSnapshot, VixReading,
    YieldCurveReading,
};

use crate::fallback::{resolve, Attempt};
use crate::readings::{
    index_rsi, inflation_reading, market_rsi_reading, money_supply_reading, vix_reading, yield_curve_reading,
    NASDAQ_SYMBOL, SP500_SYMBOL, VIX_SYMBOL,
};
use crate::snapshot::build_snapshot;
use crate::{
    normalize_symbol, round_to, symbol_key, FetchOutcome, OrchestratorConfig, SignalClass, SignalSources,
};

const VIX_LOOKBACK_DAYS: u32 = 30;
const RSI_LOOKBACK_DAYS: u32 = 90;
/// 12 YoY points need 12 extra months behind them, plus slack for gaps
const CPI_OBSERVATIONS: usize = 15;
const M2_OBSERVATIONS: usize = 26;

/// Every macro reading with its provenance, plus the derived fear score
#[derive(Debug, Clone, Serialize)]
pub struct MacroDashboard {
    pub fear_score: u32,
    pub fear_greed: FetchOutcome<FearGreedReading>,
    pub vix: FetchOutcome<VixReading>,
    pub market_rsi: FetchOutcome<MarketRsiReading>,
    pub inflation: FetchOutcome<InflationReading>,
    pub money_supply: FetchOutcome<MoneySupplyReading>,
    pub yield_curve: FetchOutcome<YieldCurveReading>,
}

impl MacroDashboard {
    pub fn context(&self) -> MacroContext {
        macro_context(
            self.fear_greed.value(),
            self.vix.value(),
            self.market_rsi.value(),
            self.yield_curve.value(),
            self.money_supply.value(),
        )
    }
}

fn macro_context(
    fear_greed: Option<&FearGreedReading>,
    vix: Option<&VixReading>,
    market_rsi: Option<&MarketRsiReading>,
    yield_curve: Option<&YieldCurveReading>,
    money_supply: Option<&MoneySupplyReading>,
) -> MacroContext {
    MacroContext {
        fear_score: composite_fear_score(
            fear_greed.map(|r| r.value),
            vix.map(|r| r.current),
            market_rsi.and_then(|r| r.sp500.rsi),
        ),
        yield_spread: yield_curve.map(|r| r.spread),
        m2_yoy_pct: money_supply.and_then(|r| r.latest_yoy_pct),
        m2_consecutive_months: money_supply.map(|r| r.consecutive_months).unwrap_or(0),
    }
}

/// Fetches (cache first), scores and ranks a watchlist.
///
/// Cheap to clone: the cache and providers are shared.
#[derive(Clone)]
pub struct WatchlistOrchestrator {
    cache: Arc<TieredCache>,
    sources: Arc<SignalSources>,
    engine: ScoreEngine,
    config: OrchestratorConfig,
}

impl WatchlistOrchestrator {
    pub fn new(cache: Arc<TieredCache>, sources: SignalSources, config: OrchestratorConfig) -> Self {
        Self {
            cache,
            sources: Arc::new(sources),
            engine: ScoreEngine::new(),
            config,
        }
    }

    pub fn with_engine(mut self, engine: ScoreEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn cache(&self) -> &Arc<TieredCache> {
        &self.cache
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    async fn resolve_market<T>(&self, class: SignalClass, attempts: Vec<Attempt<'_, T>>) -> FetchOutcome<T>
    where
        T: Serialize + serde::de::DeserializeOwned + Send,
    {
        resolve(
            &self.cache,
            class.key(),
            self.config.ttls.for_class(class),
            self.config.fetch_timeout,
            attempts,
        )
        .await
    }

    // ── macro signals ────────────────────────────────────────────────

    pub async fn fear_greed(&self) -> FetchOutcome<FearGreedReading> {
        let attempts = self
            .sources
            .sentiment
            .iter()
            .map(|src| Attempt::new(src.name(), src.fear_greed()))
            .collect();
        self.resolve_market(SignalClass::FearGreed, attempts).await
    }

    pub async fn vix(&self) -> FetchOutcome<VixReading> {
        let attempts = self
            .sources
            .market_history
            .iter()
            .map(|src| {
                Attempt::new(
                    src.name(),
                    Box::pin(async move {
                        let closes = src.daily_closes(VIX_SYMBOL, VIX_LOOKBACK_DAYS).await?;
                        vix_reading(&closes)
                    }),
                )
            })
            .collect();
        self.resolve_market(SignalClass::Volatility, attempts).await
    }

    pub async fn market_rsi(&self) -> FetchOutcome<MarketRsiReading> {
        let attempts = self
            .sources
            .market_history
            .iter()
            .map(|src| {
                Attempt::new(
                    src.name(),
                    Box::pin(async move {
                        let sp500 = fetch_index_rsi(&**src, SP500_SYMBOL).await;
                        let nasdaq = fetch_index_rsi(&**src, NASDAQ_SYMBOL).await;
                        market_rsi_reading(sp500, nasdaq)
                    }),
                )
            })
            .collect();
        self.resolve_market(SignalClass::MarketRsi, attempts).await
    }

    pub async fn inflation(&self) -> FetchOutcome<InflationReading> {
        let attempts = self
            .sources
            .macro_series
            .iter()
            .map(|src| {
                Attempt::new(
                    src.name(),
                    Box::pin(async move {
                        let observations = src.observations(MacroSeries::Cpi, CPI_OBSERVATIONS).await?;
                        inflation_reading(&observations)
                    }),
                )
            })
            .collect();
        self.resolve_market(SignalClass::Inflation, attempts).await
    }

    pub async fn money_supply(&self) -> FetchOutcome<MoneySupplyReading> {
        let attempts = self
            .sources
            .macro_series
            .iter()
            .map(|src| {
                Attempt::new(
                    src.name(),
                    Box::pin(async move {
                        let observations = src.observations(MacroSeries::M2, M2_OBSERVATIONS).await?;
                        money_supply_reading(&observations)
                    }),
                )
            })
            .collect();
        self.resolve_market(SignalClass::MoneySupply, attempts).await
    }

    pub async fn yield_curve(&self) -> FetchOutcome<YieldCurveReading> {
        let attempts = self
            .sources
            .rates
            .iter()
            .map(|src| {
                Attempt::new(
                    src.name(),
                    Box::pin(async move {
                        let rates = src.treasury_rates().await?;
                        yield_curve_reading(rates, src.name())
                    }),
                )
            })
            .collect();
        self.resolve_market(SignalClass::YieldCurve, attempts).await
    }

    /// Macro inputs for one scoring pass. Never fails: missing readings
    /// leave their fields absent (or zero for the fear score).
    pub async fn fetch_macro_context(&self) -> MacroContext {
        let (fear_greed, vix, market_rsi, yield_curve, money_supply) = tokio::join!(
            self.fear_greed(),
            self.vix(),
            self.market_rsi(),
            self.yield_curve(),
            self.money_supply(),
        );
        let ctx = macro_context(
            fear_greed.value(),
            vix.value(),
            market_rsi.value(),
            yield_curve.value(),
            money_supply.value(),
        );
        tracing::info!(
            "Macro context: fear={} spread={:?} m2={:?} ({} months)",
            ctx.fear_score,
            ctx.yield_spread,
            ctx.m2_yoy_pct,
            ctx.m2_consecutive_months
        );
        ctx
    }

    pub async fn macro_dashboard(&self) -> MacroDashboard {
        let (fear_greed, vix, market_rsi, inflation, money_supply, yield_curve) = tokio::join!(
            self.fear_greed(),
            self.vix(),
            self.market_rsi(),
            self.inflation(),
            self.money_supply(),
            self.yield_curve(),
        );
        let mut dashboard = MacroDashboard {
            fear_score: 0,
            fear_greed,
            vix,
            market_rsi,
            inflation,
            money_supply,
            yield_curve,
        };
        dashboard.fear_score = dashboard.context().fear_score;
        dashboard
    }

    // ── per-symbol data ──────────────────────────────────────────────

    /// Cache-accelerated snapshot. Falls back to stale cache, then to an
    /// explicit unavailable snapshot.
    pub async fn get_symbol_snapshot(&self, symbol: &str) -> SymbolSnapshot {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return SymbolSnapshot::unavailable(symbol, "empty symbol");
        }

        let now = self.cache.now();
        let sym = symbol.as_str();
        let attempts = self
            .sources
            .securities
            .iter()
            .map(|src| {
                Attempt::new(
                    src.name(),
                    Box::pin(async move {
                        let profile = src.profile(sym).await?;
                        build_snapshot(sym, profile, now)
                    }),
                )
            })
            .collect();

        let outcome = resolve(
            &self.cache,
            &symbol_key(SignalClass::Stock, sym),
            self.config.ttls.stock,
            self.config.fetch_timeout,
            attempts,
        )
        .await;

        match outcome {
            FetchOutcome::Cached { value } | FetchOutcome::Fetched { value, .. } => value,
            FetchOutcome::Stale { mut value } => {
                value.stale = true;
                value
            }
            FetchOutcome::Unavailable { reason } => SymbolSnapshot::unavailable(symbol, reason),
        }
    }

    pub async fn live_quote(&self, symbol: &str) -> FetchOutcome<LiveQuote> {
        let symbol = normalize_symbol(symbol);
        let sym = symbol.as_str();
        let attempts = self
            .sources
            .securities
            .iter()
            .map(|src| Attempt::new(src.name(), src.quote(sym)))
            .collect();

        resolve(
            &self.cache,
            &symbol_key(SignalClass::Price, sym),
            self.config.ttls.price,
            self.config.fetch_timeout,
            attempts,
        )
        .await
    }

    /// Latest price and day change per symbol, in input order
    pub async fn live_prices(&self, symbols: &[String]) -> Vec<PriceQuote> {
        let quotes = self
            .fan_out(symbols, |this, symbol| async move { this.live_quote(&symbol).await })
            .await;

        symbols
            .iter()
            .zip(quotes)
            .map(|(symbol, quote)| price_quote(normalize_symbol(symbol), quote.and_then(|q| q.into_value())))
            .collect()
    }

    // ── scoring ──────────────────────────────────────────────────────

    pub fn score(&self, ctx: &MacroContext, snapshot: &SymbolSnapshot) -> ScoreResult {
        self.engine.score(ctx, snapshot)
    }

    /// Fetch every symbol through the bounded pool, wait for all of them,
    /// then score and sort by descending total. Ties keep input order.
    pub async fn rank_watchlist(&self, symbols: &[String], ctx: &MacroContext) -> Vec<RankedSymbol> {
        let started = Instant::now();
        let snapshots = self
            .fan_out(symbols, |this, symbol| async move { this.get_symbol_snapshot(&symbol).await })
            .await;

        let mut ranked: Vec<RankedSymbol> = symbols
            .iter()
            .zip(snapshots)
            .map(|(symbol, snapshot)| {
                let snapshot = snapshot.unwrap_or_else(|| {
                    SymbolSnapshot::unavailable(normalize_symbol(symbol), "fetch worker failed")
                });
                let score = self.engine.score(ctx, &snapshot);
                RankedSymbol { snapshot, score }
            })
            .collect();

        ranked.sort_by(|a, b| b.score.total_score.cmp(&a.score.total_score));

        let unavailable = ranked.iter().filter(|r| !r.snapshot.is_available()).count();
        tracing::info!(
            "Ranked {} symbols ({} unavailable) in {}ms",
            ranked.len(),
            unavailable,
            started.elapsed().as_millis()
        );
        ranked
    }

    /// Force the next read of every signal to go to the providers
    pub async fn invalidate_all(&self) -> Result<u64, CacheError> {
        self.cache.invalidate_all().await
    }

    /// Run `task` once per symbol with at most `max_workers` in flight.
    /// Results come back in input order; a panicked task yields `None`.
    async fn fan_out<R, F, Fut>(&self, symbols: &[String], task: F) -> Vec<Option<R>>
    where
        F: Fn(Self, String) -> Fut,
        Fut: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        if symbols.is_empty() {
            return Vec::new();
        }

        let workers = symbols.len().min(self.config.max_workers.max(1));
        let permits = Arc::new(Semaphore::new(workers));

        let handles: Vec<_> = symbols
            .iter()
            .map(|symbol| {
                let permits = permits.clone();
                let job = task(self.clone(), symbol.clone());
                tokio::spawn(async move {
                    let _permit = permits.acquire_owned().await;
                    job.await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (symbol, handle) in symbols.iter().zip(handles) {
            match handle.await {
                Ok(result) => results.push(Some(result)),
                Err(e) => {
                    tracing::error!("Fetch worker for {} failed: {}", symbol, e);
                    results.push(None);
                }
            }
        }
        results
    }
}

async fn fetch_index_rsi(src: &dyn MarketHistorySource, symbol: &str) -> IndexRsi {
    match src.daily_closes(symbol, RSI_LOOKBACK_DAYS).await {
        Ok(closes) => index_rsi(symbol, &closes),
        Err(e) => {
            tracing::warn!("{} history for {} failed: {}", src.name(), symbol, e);
            index_rsi(symbol, &[])
        }
    }
}

/// A previous close at or below zero gives no change
fn price_quote(symbol: String, quote: Option<LiveQuote>) -> PriceQuote {
    let price = quote.as_ref().map(|q| q.price);
    let previous_close = quote.and_then(|q| q.previous_close).filter(|p| *p > 0.0);
    let change_pct = match (price, previous_close) {
        (Some(price), Some(prev)) => Some(round_to((price - prev) / prev * 100.0, 2)),
        _ => None,
    };
    PriceQuote {
        symbol,
        price,
        previous_close,
        change_pct,
    }
}
