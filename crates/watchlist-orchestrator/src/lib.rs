pub mod config;
pub mod fallback;
pub mod keys;
pub mod orchestrator;
pub mod readings;
pub mod snapshot;
pub mod sources;


pub use config::*;
pub use fallback::FetchOutcome;
pub use keys::*;
pub use orchestrator::*;
pub use sources::SignalSources;

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
