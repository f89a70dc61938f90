//! Edge calculation and the edge threshold table.

use serde::Serialize;

use crate::config::Config;
use crate::market::{MarketSnapshot, Side};

/// Estimated vs implied probability for one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EdgeQuote {
    /// Side being priced.
    pub side: Side,
    /// Our probability estimate for this side, in points.
    pub probability: u32,
    /// Market-implied probability (the ask), in points.
    pub implied: u32,
    /// `probability - implied`.
    pub edge: i32,
}

/// Edge in points.
pub fn edge_points(probability: u32, implied: u32) -> i32 {
    probability as i32 - implied as i32
}

/// Price one side against the market. `None` when the side has no ask.
pub fn quote(market: &MarketSnapshot, side: Side, yes_probability: u32) -> Option<EdgeQuote> {
    let probability = match side {
        Side::Yes => yes_probability,
        Side::No => 100 - yes_probability.min(100),
    };
    let implied = market.implied_probability(side)?;

    Some(EdgeQuote {
        side,
        probability,
        implied,
        edge: edge_points(probability, implied),
    })
}

/// The side with the larger edge, ties going to YES.
///
/// Returns `None` only when neither side has an ask.
pub fn best_quote(market: &MarketSnapshot, yes_probability: u32) -> Option<EdgeQuote> {
    let yes = quote(market, Side::Yes, yes_probability);
    let no = quote(market, Side::No, yes_probability);

    match (yes, no) {
        (Some(y), Some(n)) => Some(if n.edge > y.edge { n } else { y }),
        (y, n) => y.or(n),
    }
}

/// Minimum edge for a BUY given the current streak.
pub fn minimum_edge(current_streak: i32, config: &Config) -> i32 {
    if current_streak <= config.losing_streak_threshold {
        config.streak_min_edge_points
    } else {
        config.min_edge_points
    }
}

/// Rows of the threshold table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EdgeTier {
    /// Below the minimum edge: PASS.
    Insufficient,
    /// Minimum edge up to 12 points: 1 share.
    Thin,
    /// 12 to 20 points: 1 to 2 shares.
    Solid,
    /// 20 points and above: up to 3 shares.
    Strong,
}

impl EdgeTier {
    /// Classify an edge against the minimum in force.
    pub fn classify(edge: i32, minimum: i32) -> Self {
        if edge < minimum {
            EdgeTier::Insufficient
        } else if edge < 12 {
            EdgeTier::Thin
        } else if edge < 20 {
            EdgeTier::Solid
        } else {
            EdgeTier::Strong
        }
    }

    /// Most shares this tier allows.
    pub fn max_shares(&self) -> u32 {
        match self {
            EdgeTier::Insufficient => 0,
            EdgeTier::Thin => 1,
            EdgeTier::Solid => 2,
            EdgeTier::Strong => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market(yes_ask: u32, no_ask: u32) -> MarketSnapshot {
        MarketSnapshot {
            ticker: "T".to_string(),
            yes_ask: Some(yes_ask),
            no_ask: Some(no_ask),
            ..MarketSnapshot::default()
        }
    }

    #[test]
    fn edge_is_probability_minus_ask() {
        // 62% vs a 48¢ ask
        let q = quote(&market(48, 54), Side::Yes, 62).unwrap();
        assert_eq!(q.edge, 14);
        assert_eq!(q.implied, 48);

        let q = quote(&market(48, 30), Side::No, 62).unwrap();
        assert_eq!(q.probability, 38);
        assert_eq!(q.edge, 8);
    }

    #[test]
    fn best_quote_prefers_larger_edge() {
        let q = best_quote(&market(48, 54), 62).unwrap();
        assert_eq!(q.side, Side::Yes);

        let q = best_quote(&market(60, 30), 45).unwrap();
        assert_eq!(q.side, Side::No);
        assert_eq!(q.edge, 25);
    }

    #[test]
    fn best_quote_with_one_side_quoted() {
        let m = MarketSnapshot {
            ticker: "T".to_string(),
            no_ask: Some(40),
            ..MarketSnapshot::default()
        };
        assert_eq!(best_quote(&m, 50).unwrap().side, Side::No);

        let empty = MarketSnapshot::default();
        assert!(best_quote(&empty, 50).is_none());
    }

    #[test]
    fn streak_raises_minimum_edge() {
        let config = Config::default();
        assert_eq!(minimum_edge(0, &config), 8);
        assert_eq!(minimum_edge(-2, &config), 8);
        assert_eq!(minimum_edge(-3, &config), 12);
        assert_eq!(minimum_edge(-5, &config), 12);
    }

    #[test]
    fn threshold_table() {
        assert_eq!(EdgeTier::classify(7, 8), EdgeTier::Insufficient);
        assert_eq!(EdgeTier::classify(8, 8), EdgeTier::Thin);
        assert_eq!(EdgeTier::classify(11, 8), EdgeTier::Thin);
        assert_eq!(EdgeTier::classify(12, 8), EdgeTier::Solid);
        assert_eq!(EdgeTier::classify(14, 8), EdgeTier::Solid);
        assert_eq!(EdgeTier::classify(19, 8), EdgeTier::Solid);
        assert_eq!(EdgeTier::classify(20, 8), EdgeTier::Strong);
        assert_eq!(EdgeTier::classify(11, 12), EdgeTier::Insufficient);
        assert_eq!(EdgeTier::Solid.max_shares(), 2);
    }
}
