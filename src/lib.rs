//! Decision policy for Kalshi BTC 15-minute Up/Down binary contracts.
//!
//! Each cycle the policy estimates the probability that BTC closes the window
//! up, compares it to the price of each side, and decides BUY or PASS:
//!
//! ```text
//! Estimated P(YES):  62%
//! YES ask:           48¢
//! ─────────────────────
//! Edge:              +14 points -> BUY 1-2 YES @ ≤ 48¢
//! ```
//!
//! The same rules guard decisions produced by a language model: responses are
//! schema-checked, their edge is recomputed from the market, and oversized or
//! overpriced orders are clamped.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`market`]: Market snapshot and sides
//! - [`orderbook`]: Depth levels and imbalance
//! - [`signal`]: Spot indicators and the probability estimate
//! - [`performance`]: Trade history and statistics
//! - [`policy`]: Edge, sizing, pricing, the evaluator and guardrails
//! - [`decision`]: The output record, response parsing and schema checks
//! - [`risk`]: Pre-trade risk gate
//! - [`trading`]: Open positions and take-profit / stop-loss exits
//! - [`engine`]: One decision cycle end to end
//! - [`replay`]: Sequential replay of recorded cycles
//! - [`prompt`]: Prompt rendering for model-driven cycles
//! - [`metrics`]: Decision metrics

pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod market;
pub mod metrics;
pub mod orderbook;
pub mod performance;
pub mod policy;
pub mod prompt;
pub mod replay;
pub mod risk;
pub mod signal;
pub mod trading;

pub use config::Config;
pub use decision::{Action, Decision};
pub use engine::{run_cycle, CycleInput, CycleOutcome, CycleReport};
pub use error::{BotError, Result};
pub use policy::{DecisionContext, PolicyEvaluator};
