//! Spread-aware entry pricing.

use serde::Serialize;

use crate::config::Config;
use crate::market::{MarketSnapshot, Side};

/// How the entry price was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PriceMode {
    /// Take liquidity at the ask.
    Aggressive,
    /// Rest one cent above the bid.
    Passive,
}

/// Entry price decision for one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntryPrice {
    /// Limit price in cents.
    pub price_cents: u32,
    /// Aggressive or passive.
    pub mode: PriceMode,
    /// Spread observed when pricing, if both sides of the quote existed.
    pub spread_cents: Option<u32>,
}

/// Choose the limit price for buying `side`.
///
/// Narrow spread: pay the ask. Wide spread (beyond `wide_spread_cents`): post
/// one cent above the bid, unless the edge is high conviction. Returns `None`
/// when the side has no ask.
pub fn entry_price(market: &MarketSnapshot, side: Side, edge: i32, config: &Config) -> Option<EntryPrice> {
    let ask = market.ask(side)?;
    let spread = market.spread(side);

    let wide = spread.is_some_and(|s| s > config.wide_spread_cents);
    let high_conviction = edge >= config.high_conviction_edge_points;

    match (wide, high_conviction, market.bid(side)) {
        (true, false, Some(bid)) => Some(EntryPrice {
            price_cents: (bid + 1).min(ask),
            mode: PriceMode::Passive,
            spread_cents: spread,
        }),
        _ => Some(EntryPrice {
            price_cents: ask,
            mode: PriceMode::Aggressive,
            spread_cents: spread,
        }),
    }
}
