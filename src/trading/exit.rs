//! Take-profit / stop-loss checks for an open position.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use tracing::info;

use crate::config::Config;
use crate::market::{MarketSnapshot, Side};
use crate::metrics;
use crate::performance::TradeResult;

/// Position held from an earlier cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPosition {
    /// Market ticker.
    pub ticker: String,
    /// Side held.
    pub side: Side,
    /// Contracts held.
    pub shares: u32,
    /// Average entry price in cents.
    pub entry_price_cents: u32,
}

impl OpenPosition {
    /// Calculate the cost basis in cents.
    pub fn cost_basis_cents(&self) -> i64 {
        self.shares as i64 * self.entry_price_cents as i64
    }

    /// P&L per share if sold at `exit_price_cents`.
    pub fn pnl_per_share(&self, exit_price_cents: u32) -> i32 {
        exit_price_cents as i32 - self.entry_price_cents as i32
    }

    /// Unrealized P&L per share against the best bid on the held side.
    pub fn unrealized_pnl_per_share(&self, market: &MarketSnapshot) -> Option<i32> {
        market.bid(self.side).map(|bid| self.pnl_per_share(bid))
    }
}

/// Why a position is being closed early.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExitReason {
    /// Profit per share reached the take-profit level.
    TakeProfit,
    /// Loss per share reached the stop-loss level.
    StopLoss,
}

impl ExitReason {
    /// Ledger outcome recorded for this exit.
    pub fn trade_result(&self) -> TradeResult {
        match self {
            ExitReason::TakeProfit => TradeResult::ExitTakeProfit,
            ExitReason::StopLoss => TradeResult::ExitStopLoss,
        }
    }
}

/// Instruction to sell a position at the best bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExitSignal {
    /// Market ticker.
    pub ticker: String,
    /// Side being sold.
    pub side: Side,
    /// Why we are exiting.
    pub reason: ExitReason,
    /// Contracts to sell.
    pub shares: u32,
    /// Entry price in cents.
    pub entry_price_cents: u32,
    /// Limit price for the sell (best bid) in cents.
    pub exit_price_cents: u32,
    /// P&L per share in cents.
    pub pnl_per_share_cents: i32,
    /// Total P&L in cents.
    pub pnl_cents: i64,
}

impl ExitSignal {
    /// Total P&L in dollars for display.
    pub fn pnl_dollars(&self) -> Decimal {
        Decimal::new(self.pnl_cents, 2)
    }
}

/// Check whether a position should be closed now.
///
/// Returns `None` when there is no bid to sell into or neither threshold
/// has been reached.
pub fn check_exit(position: &OpenPosition, market: &MarketSnapshot, config: &Config) -> Option<ExitSignal> {
    let exit_price = market.bid(position.side)?;
    let pnl = position.pnl_per_share(exit_price);

    let reason = if pnl >= config.take_profit_cents as i32 {
        ExitReason::TakeProfit
    } else if pnl <= -(config.stop_loss_cents as i32) {
        ExitReason::StopLoss
    } else {
        return None;
    };

    let signal = ExitSignal {
        ticker: position.ticker.clone(),
        side: position.side,
        reason,
        shares: position.shares,
        entry_price_cents: position.entry_price_cents,
        exit_price_cents: exit_price,
        pnl_per_share_cents: pnl,
        pnl_cents: pnl as i64 * position.shares as i64,
    };

    metrics::inc_exits(reason.into());
    info!(
        ticker = %signal.ticker,
        side = %signal.side,
        reason = %reason,
        entry = signal.entry_price_cents,
        exit = signal.exit_price_cents,
        pnl = %signal.pnl_dollars(),
        "Exit triggered"
    );

    Some(signal)
}
