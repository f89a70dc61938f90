//! Performance module: trade history and the statistics derived from it.
//!
//! This module handles:
//! - Trade records and their outcomes
//! - Win rate, signed streak, P&L and drawdown

pub mod stats;
pub mod types;

pub use stats::compute as compute_stats;
pub use types::{PerformanceState, TradeRecord, TradeResult};
