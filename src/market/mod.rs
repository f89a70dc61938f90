//! Market module for Kalshi BTC Up/Down contracts.
//!
//! This module handles:
//! - Contract sides and the market snapshot a cycle decides on
//! - Deriving asks, spreads and implied probabilities from quotes

pub mod types;

pub use types::{MarketSnapshot, Side};
