//! watchlist: rank a watchlist, inspect macro signals and manage the cache.
//!
//! Usage:
//!   watchlist rank AAPL MSFT QQQ --fixtures ./fixtures
//!   watchlist rank AAPL MSFT --json
//!   watchlist macro --fixtures ./fixtures
//!   watchlist prices AAPL MSFT
//!   watchlist invalidate

mod fixtures;
mod report;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tiered_cache::{SqliteStore, SystemClock, TieredCache};
use watchlist_orchestrator::{OrchestratorConfig, SignalSources, WatchlistOrchestrator};

use crate::fixtures::FixtureProvider;

const USAGE: &str = "usage: watchlist <rank SYMBOL...|macro|prices SYMBOL...|invalidate> [--fixtures DIR] [--json]";

#[derive(Debug, PartialEq)]
enum Command {
    Rank(Vec<String>),
    Macro,
    Prices(Vec<String>),
    Invalidate,
}

#[derive(Debug, PartialEq)]
struct CliArgs {
    command: Command,
    fixtures: Option<String>,
    json: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let json = args.iter().any(|a| a == "--json");
    let fixtures_at = args.iter().position(|a| a == "--fixtures");
    let fixtures = match fixtures_at {
        Some(i) => Some(args.get(i + 1).cloned().context("--fixtures needs a directory")?),
        None => None,
    };

    let positional: Vec<&String> = args
        .iter()
        .enumerate()
        .filter(|(i, a)| !a.starts_with("--") && fixtures_at.map_or(true, |f| *i != f + 1))
        .map(|(_, a)| a)
        .collect();

    let Some((name, rest)) = positional.split_first() else {
        bail!(USAGE);
    };
    let symbols: Vec<String> = rest.iter().map(|s| s.to_string()).collect();

    let command = match name.as_str() {
        "rank" | "prices" if symbols.is_empty() => bail!("{} needs at least one symbol\n{}", name, USAGE),
        "rank" => Command::Rank(symbols),
        "prices" => Command::Prices(symbols),
        "macro" => Command::Macro,
        "invalidate" => Command::Invalidate,
        other => bail!("unknown command {:?}\n{}", other, USAGE),
    };

    Ok(CliArgs { command, fixtures, json })
}

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "watchlist=info,watchlist_orchestrator=info,tiered_cache=warn".into())
    };

    // stdout carries the report
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .init();
    }
}

fn build_sources(fixtures: Option<&str>) -> SignalSources {
    match fixtures {
        Some(dir) => {
            let provider = Arc::new(FixtureProvider::new(dir));
            SignalSources::new()
                .with_sentiment(provider.clone())
                .with_market_history(provider.clone())
                .with_macro_series(provider.clone())
                .with_rates(provider.clone())
                .with_securities(provider)
        }
        None => {
            tracing::warn!("No --fixtures directory given; serving cached data only");
            SignalSources::new()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_args(&args)?;
    let config = OrchestratorConfig::from_env()?;

    let store = SqliteStore::connect(&config.database_url)
        .await
        .with_context(|| format!("opening cache database {}", config.database_url))?;
    let cache = Arc::new(TieredCache::with_queue_capacity(
        Arc::new(store),
        Arc::new(SystemClock),
        config.write_queue,
    ));

    let sources = build_sources(cli.fixtures.as_deref());
    let orchestrator = WatchlistOrchestrator::new(cache.clone(), sources, config);

    match cli.command {
        Command::Rank(symbols) => {
            let ctx = orchestrator.fetch_macro_context().await;
            let ranked = orchestrator.rank_watchlist(&symbols, &ctx).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&ranked)?);
            } else {
                println!("Market fear score: {}/100\n", ctx.fear_score);
                print!("{}", report::ranking_table(&ranked));
            }
        }
        Command::Macro => {
            let dashboard = orchestrator.macro_dashboard().await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
            } else {
                print!("{}", report::dashboard_text(&dashboard));
            }
        }
        Command::Prices(symbols) => {
            let prices = orchestrator.live_prices(&symbols).await;
            if cli.json {
                let map: serde_json::Map<String, serde_json::Value> = prices
                    .into_iter()
                    .map(|q| {
                        let line = serde_json::json!({
                            "price": q.price,
                            "prev_close": q.previous_close,
                            "change_pct": q.change_pct,
                        });
                        (q.symbol, line)
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else {
                print!("{}", report::prices_text(&prices));
            }
        }
        Command::Invalidate => {
            let removed = orchestrator.invalidate_all().await?;
            println!("Cleared {} cached entries", removed);
        }
    }

    cache.flush().await;
    let stats = cache.stats();
    tracing::info!(
        "Cache: {} hits / {} misses ({:.0}% hit rate), {} deferred / {} dropped writes",
        stats.memory_hits + stats.durable_hits,
        stats.misses,
        stats.hit_rate() * 100.0,
        stats.deferred_writes,
        stats.dropped_writes
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_parse_rank_with_flags() {
        let cli = parse_args(&args("rank aapl --fixtures ./fx MSFT --json")).unwrap();
        assert_eq!(cli.command, Command::Rank(vec!["aapl".to_string(), "MSFT".to_string()]));
        assert_eq!(cli.fixtures.as_deref(), Some("./fx"));
        assert!(cli.json);
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_args(&args("macro")).unwrap().command, Command::Macro);
        assert_eq!(parse_args(&args("invalidate")).unwrap().command, Command::Invalidate);
        assert!(!parse_args(&args("macro")).unwrap().json);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(&[]).is_err());
        assert!(parse_args(&args("rank")).is_err());
        assert!(parse_args(&args("prices --json")).is_err());
        assert!(parse_args(&args("explode")).is_err());
        assert!(parse_args(&args("macro --fixtures")).is_err());
    }
}
