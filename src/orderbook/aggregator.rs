//! Order book aggregation: depth-weighted pressure between the two sides.

use super::types::{Orderbook, PriceLevel};
use crate::market::Side;

/// Number of levels from the top of each side that count toward imbalance.
pub const IMBALANCE_DEPTH: usize = 5;

/// Lower clamp for the imbalance ratio.
pub const MIN_IMBALANCE: f64 = 0.2;

/// Upper clamp for the imbalance ratio.
pub const MAX_IMBALANCE: f64 = 5.0;

/// Distance-weighted volume: level `i` from the top counts `1 / (i + 1)`.
pub fn weighted_volume(levels: &[PriceLevel]) -> f64 {
    levels
        .iter()
        .take(IMBALANCE_DEPTH)
        .enumerate()
        .map(|(i, level)| level.quantity as f64 / (i as f64 + 1.0))
        .sum()
}

/// Ratio of weighted YES bids to weighted NO bids.
///
/// Above 1.0 the book leans YES (buying pressure for UP), below 1.0 it leans
/// NO. Clamped to `[0.2, 5.0]`; an empty book reads neutral.
pub fn orderbook_imbalance(book: &Orderbook) -> f64 {
    let yes = weighted_volume(&book.sorted_levels(Side::Yes));
    let no = weighted_volume(&book.sorted_levels(Side::No));

    if no == 0.0 {
        if yes > 0.0 {
            MAX_IMBALANCE
        } else {
            1.0
        }
    } else {
        (yes / no).clamp(MIN_IMBALANCE, MAX_IMBALANCE)
    }
}
