//! Order book module for Kalshi depth data.
//!
//! This module handles:
//! - Order book types (resting bids on each side)
//! - Depth aggregation and imbalance calculations

pub mod aggregator;
pub mod types;

pub use aggregator::{orderbook_imbalance, weighted_volume};
pub use types::{Orderbook, PriceLevel};
