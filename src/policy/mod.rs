//! Decision policy for Kalshi BTC Up/Down contracts.
//!
//! This module handles:
//! - Edge calculation and the threshold table
//! - Half-Kelly sizing within each tier
//! - Spread-aware entry pricing and the price ceiling
//! - The losing-streak protocol
//! - Guardrails for externally produced decisions

pub mod edge;
pub mod evaluator;
pub mod guard;
pub mod pricing;
pub mod revision;
pub mod sizing;

pub use edge::{best_quote, edge_points, minimum_edge, EdgeQuote, EdgeTier};
pub use evaluator::{DecisionContext, PolicyEvaluator};
pub use guard::{review, Reviewed};
pub use pricing::{entry_price, EntryPrice, PriceMode};
pub use revision::{PolicyLimits, PolicyRevision};
pub use sizing::{kelly_fraction, kelly_shares};
