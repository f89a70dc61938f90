//! Trade history and performance types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;

use crate::market::Side;

/// Outcome recorded for a trade.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TradeResult {
    /// Order placed, market not settled.
    #[default]
    Pending,
    /// Settled in our favour.
    Win,
    /// Settled against us.
    Loss,
    /// Order cancelled before filling.
    #[serde(alias = "canceled")]
    #[strum(to_string = "cancelled", serialize = "canceled")]
    Cancelled,
    /// Closed early at the take-profit threshold.
    ExitTakeProfit,
    /// Closed early at the stop-loss threshold.
    ExitStopLoss,
    /// Pending entry written off after it never resolved.
    Unknown,
}

impl TradeResult {
    /// Whether the trade has a realized P&L.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            TradeResult::Win
                | TradeResult::Loss
                | TradeResult::ExitTakeProfit
                | TradeResult::ExitStopLoss
        )
    }
}

/// One row of trade history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// When the order was placed.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Market ticker.
    pub ticker: String,
    /// Side bought.
    pub side: Side,
    /// Contracts bought.
    pub shares: u32,
    /// Price paid per contract in cents.
    pub price_cents: u32,
    /// Outcome.
    #[serde(default)]
    pub result: TradeResult,
    /// Realized P&L in cents (0 until settled).
    #[serde(default)]
    pub pnl_cents: i64,
}

impl TradeRecord {
    /// Cost basis in cents.
    pub fn cost_cents(&self) -> i64 {
        self.price_cents as i64 * self.shares as i64
    }

    /// Whether this settled trade counts as a win.
    ///
    /// Early exits are scored by realized P&L.
    pub fn is_win(&self) -> bool {
        match self.result {
            TradeResult::Win => true,
            TradeResult::ExitTakeProfit | TradeResult::ExitStopLoss => self.pnl_cents > 0,
            _ => false,
        }
    }

    /// Settle against the market result: a winning contract pays 100¢.
    pub fn settle(&mut self, winning_side: Side) {
        if self.side == winning_side {
            self.result = TradeResult::Win;
            self.pnl_cents = (100 - self.price_cents as i64) * self.shares as i64;
        } else {
            self.result = TradeResult::Loss;
            self.pnl_cents = -self.cost_cents();
        }
    }
}

/// Aggregate performance over a trade history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceState {
    /// Settled trades.
    pub total_trades: u32,
    /// Winning trades.
    pub wins: u32,
    /// Losing trades.
    pub losses: u32,
    /// Wins / settled trades (0..=1).
    pub win_rate: Decimal,
    /// Cumulative realized P&L in cents.
    pub total_pnl_cents: i64,
    /// Realized P&L for trades placed today (UTC).
    pub today_pnl_cents: i64,
    /// Signed streak: +n for n consecutive wins, -n for n consecutive losses.
    pub current_streak: i32,
    /// Largest peak-to-trough drop of the cumulative P&L curve, in cents.
    pub max_drawdown_cents: i64,
    /// Mean P&L of winning trades in cents.
    pub avg_win_cents: Decimal,
    /// Mean P&L of losing trades in cents (negative).
    pub avg_loss_cents: Decimal,
    /// Most recent settled results, newest first.
    pub recent_results: Vec<TradeResult>,
}

impl PerformanceState {
    /// Total P&L in dollars for display.
    pub fn total_pnl_dollars(&self) -> Decimal {
        Decimal::new(self.total_pnl_cents, 2)
    }

    /// Whether the current streak is at or below a (negative) threshold.
    pub fn on_losing_streak(&self, threshold: i32) -> bool {
        self.current_streak <= threshold
    }
}
