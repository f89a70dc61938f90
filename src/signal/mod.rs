//! Signal module: spot-price indicators and the YES probability estimate.
//!
//! This module handles:
//! - Candle and indicator types
//! - RSI/EMA/SMA, volatility, momentum and trend alignment
//! - Combining indicators with orderbook pressure into a probability

pub mod estimate;
pub mod indicators;
pub mod types;

pub use estimate::{estimate_yes_probability, ProbabilityEstimate, RsiZone};
pub use indicators::compute as compute_indicators;
pub use types::{Candle, Momentum, PriceFeed, PriceIndicators, TrendAlignment};
