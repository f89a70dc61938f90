//! Order book types and data structures.

use serde::{Deserialize, Serialize};

use crate::market::Side;

/// Single price level in an order book.
///
/// Deserializes from Kalshi's `[price, quantity]` pairs or from an object.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "LevelRepr")]
pub struct PriceLevel {
    /// Price at this level in cents.
    pub price: u32,
    /// Contracts resting at this price.
    pub quantity: u32,
}

impl PriceLevel {
    /// Create a new price level.
    pub fn new(price: u32, quantity: u32) -> Self {
        Self { price, quantity }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Pair(u32, u32),
    Named { price: u32, quantity: u32 },
}

impl From<LevelRepr> for PriceLevel {
    fn from(repr: LevelRepr) -> Self {
        match repr {
            LevelRepr::Pair(price, quantity) | LevelRepr::Named { price, quantity } => {
                Self { price, quantity }
            }
        }
    }
}

/// Kalshi order book: resting bids for YES and for NO.
///
/// Kalshi publishes only bids; an ask on one side is the complement of the
/// best bid on the other. Levels may arrive in any order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Orderbook {
    /// YES bid levels.
    #[serde(default)]
    pub yes: Vec<PriceLevel>,
    /// NO bid levels.
    #[serde(default)]
    pub no: Vec<PriceLevel>,
}

impl Orderbook {
    /// Bid levels for one side.
    pub fn levels(&self, side: Side) -> &[PriceLevel] {
        match side {
            Side::Yes => &self.yes,
            Side::No => &self.no,
        }
    }

    /// Highest bid price for a side.
    pub fn best_bid(&self, side: Side) -> Option<u32> {
        self.levels(side)
            .iter()
            .filter(|l| l.quantity > 0)
            .map(|l| l.price)
            .max()
    }

    /// Levels for a side sorted best (highest) first.
    pub fn sorted_levels(&self, side: Side) -> Vec<PriceLevel> {
        let mut levels: Vec<PriceLevel> = self
            .levels(side)
            .iter()
            .copied()
            .filter(|l| l.quantity > 0)
            .collect();
        levels.sort_by(|a, b| b.price.cmp(&a.price));
        levels
    }

    /// Total contracts resting on a side.
    pub fn total_depth(&self, side: Side) -> u64 {
        self.levels(side).iter().map(|l| l.quantity as u64).sum()
    }

    /// Check if both sides are empty.
    pub fn is_empty(&self) -> bool {
        self.total_depth(Side::Yes) == 0 && self.total_depth(Side::No) == 0
    }
}
