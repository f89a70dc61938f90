//! Market-related types for Kalshi BTC Up/Down binary contracts.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::MarketError;
use crate::orderbook::Orderbook;

/// Contract side. YES pays out if BTC settles up, NO if down.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// BTC goes up.
    #[strum(to_string = "yes", serialize = "YES", serialize = "up", serialize = "UP")]
    #[default]
    Yes,
    /// BTC goes down.
    #[strum(to_string = "no", serialize = "NO", serialize = "down", serialize = "DOWN")]
    No,
}

impl Side {
    /// Get the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Yes => Side::No,
            Side::No => Side::Yes,
        }
    }

    /// Upper-case label used in logs and prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Side::Yes => "YES",
            Side::No => "NO",
        }
    }
}

/// Point-in-time view of one market, as supplied to a decision cycle.
///
/// All prices are integer cents. A Kalshi contract pays 100¢ to the winning
/// side, so a YES ask of 48¢ implies a 48% market probability of UP.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Market ticker (e.g. "KXBTC15M-25JAN011200-00").
    pub ticker: String,
    /// Human-readable market title.
    #[serde(default)]
    pub title: Option<String>,
    /// Best YES bid.
    #[serde(default)]
    pub yes_bid: Option<u32>,
    /// Best YES ask.
    #[serde(default)]
    pub yes_ask: Option<u32>,
    /// Best NO bid.
    #[serde(default)]
    pub no_bid: Option<u32>,
    /// Best NO ask.
    #[serde(default)]
    pub no_ask: Option<u32>,
    /// Last traded YES price.
    #[serde(default)]
    pub last_price: Option<u32>,
    /// Contracts traded in this market.
    #[serde(default)]
    pub volume: u64,
    /// Contracts traded in the last 24 hours.
    #[serde(default)]
    pub volume_24h: u64,
    /// Open contracts.
    #[serde(default)]
    pub open_interest: u64,
    /// Minutes until the market closes.
    #[serde(default)]
    pub minutes_to_expiry: Option<f64>,
    /// Resting bids on both sides.
    #[serde(default)]
    pub orderbook: Orderbook,
}

impl MarketSnapshot {
    /// Best bid for a side: quoted value, else the top of the book.
    pub fn bid(&self, side: Side) -> Option<u32> {
        let quoted = match side {
            Side::Yes => self.yes_bid,
            Side::No => self.no_bid,
        };
        quoted.or_else(|| self.orderbook.best_bid(side))
    }

    /// Best ask for a side.
    ///
    /// Buying YES at `p` is equivalent to selling NO at `100 - p`, so a missing
    /// ask is derived from the opposite side's best bid.
    pub fn ask(&self, side: Side) -> Option<u32> {
        let quoted = match side {
            Side::Yes => self.yes_ask,
            Side::No => self.no_ask,
        };
        quoted
            .or_else(|| self.bid(side.opposite()).and_then(|bid| 100u32.checked_sub(bid)))
            .filter(|ask| (1..=99).contains(ask))
    }

    /// Market-implied probability (in points) of a side winning.
    pub fn implied_probability(&self, side: Side) -> Option<u32> {
        self.ask(side)
    }

    /// Bid/ask spread for a side in cents.
    pub fn spread(&self, side: Side) -> Option<u32> {
        match (self.bid(side), self.ask(side)) {
            (Some(bid), Some(ask)) => Some(ask.saturating_sub(bid)),
            _ => None,
        }
    }

    /// Whether either side can be bought right now.
    pub fn has_quotes(&self) -> bool {
        self.ask(Side::Yes).is_some() || self.ask(Side::No).is_some()
    }

    /// Validate quoted prices.
    pub fn validate(&self) -> Result<(), MarketError> {
        if self.ticker.trim().is_empty() {
            return Err(MarketError::MissingTicker);
        }

        let quotes = [
            ("yes_bid", self.yes_bid),
            ("yes_ask", self.yes_ask),
            ("no_bid", self.no_bid),
            ("no_ask", self.no_ask),
            ("last_price", self.last_price),
        ];
        for (field, value) in quotes {
            if let Some(value) = value {
                if !(1..=99).contains(&value) {
                    return Err(MarketError::PriceOutOfRange { field, value });
                }
            }
        }

        for side in [Side::Yes, Side::No] {
            if let (Some(bid), Some(ask)) = (self.bid(side), self.ask(side)) {
                if bid > ask {
                    return Err(MarketError::CrossedQuote { side, bid, ask });
                }
            }
        }

        Ok(())
    }
}
