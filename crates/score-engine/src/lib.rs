//! Deterministic scoring of one symbol against the macro backdrop.
//!
//! Every function here is pure: absent inputs contribute zero to their
//! sub-term and never abort the pipeline.

pub mod drawdown;
pub mod engine;
pub mod fear;
pub mod fundamental;
pub mod macro_adjust;
pub mod reasons;
pub mod technical;


pub use drawdown::drawdown_score;
pub use engine::*;
pub use fear::composite_fear_score;
pub use fundamental::fundamental_score;
pub use macro_adjust::{lag_weight, liquidity_adjustment, recession_penalty};
pub use technical::technical_score;
