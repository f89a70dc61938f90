//! Sequential replay of recorded cycles with known settlements.
//!
//! Each BUY pays its cost up front and becomes a pending trade record. A
//! settlement on the cycle's market, or an early exit, resolves it before the
//! next cycle, so streaks, daily loss and balance feed forward exactly as
//! they would live.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument};

use crate::config::Config;
use crate::engine::{run_cycle, CycleInput, CycleOutcome};
use crate::error::Result;
use crate::market::Side;
use crate::performance::{compute_stats, PerformanceState, TradeRecord, TradeResult};
use crate::trading::{ExitSignal, OpenPosition};

/// Pending records older than this are written off as `unknown`.
pub const STALE_PENDING_MINUTES: i64 = 30;

/// One recorded cycle plus how its market settled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayCycle {
    /// Cycle inputs. `history` and `performance` are only honoured on the
    /// first cycle; later cycles use the replayed history. A position opened
    /// during the replay is carried forward unless the cycle names one.
    #[serde(flatten)]
    pub input: CycleInput,
    /// Winning side, when known.
    #[serde(default)]
    pub settlement: Option<Side>,
}

/// What happened in one replayed cycle.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayStep {
    /// Position in the input.
    pub index: usize,
    /// Market ticker.
    pub ticker: String,
    /// Cycle outcome.
    pub outcome: CycleOutcome,
    /// P&L realized during this cycle by settlements and exits.
    pub pnl_cents: Option<i64>,
}

/// Totals over a replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplaySummary {
    /// Cycles replayed.
    pub cycles: usize,
    /// BUY decisions.
    pub buys: usize,
    /// PASS decisions.
    pub passes: usize,
    /// Early exits.
    pub exits: usize,
    /// Cycles spent holding.
    pub holds: usize,
    /// Pending trades written off as unknown.
    pub stale: usize,
    /// Balance after the last cycle, when a starting balance was given.
    pub final_balance_cents: Option<i64>,
    /// Statistics over the replayed history.
    pub performance: PerformanceState,
}

/// Full replay result.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// Per-cycle results.
    pub steps: Vec<ReplayStep>,
    /// Trade history at the end of the replay.
    pub history: Vec<TradeRecord>,
    /// Totals.
    pub summary: ReplaySummary,
}

/// Replay `cycles` in order.
#[instrument(skip_all, fields(cycles = cycles.len()))]
pub fn replay(cycles: &[ReplayCycle], config: &Config) -> Result<ReplayReport> {
    let mut history: Vec<TradeRecord> = cycles
        .first()
        .map(|c| c.input.history.clone())
        .unwrap_or_default();
    let mut balance: Option<i64> = cycles
        .first()
        .and_then(|c| c.input.balance_cents)
        .map(|b| b as i64);
    let mut carried: Option<OpenPosition> = None;

    let mut steps = Vec::with_capacity(cycles.len());
    let mut summary = ReplaySummary {
        cycles: cycles.len(),
        ..ReplaySummary::default()
    };
    let mut last_time = OffsetDateTime::now_utc();

    for (index, cycle) in cycles.iter().enumerate() {
        let mut input = cycle.input.clone();
        let timestamp = input.timestamp();
        last_time = timestamp;

        let held = carried.take().filter(|p| p.ticker == input.market.ticker);
        if input.open_position.is_none() {
            input.open_position = held;
        }
        summary.stale += expire_stale_pending(&mut history, timestamp, input.open_position.as_ref());

        input.history = history.clone();
        if index > 0 {
            input.performance = None;
        }
        input.balance_cents = balance.map(|b| b.max(0) as u64);

        let report = run_cycle(&input, config)?;
        let mut realized: Option<i64> = None;

        match &report.outcome {
            CycleOutcome::Entry { decision } if decision.is_buy() => {
                summary.buys += 1;
                if let (Some(side), Some(shares), Some(price)) =
                    (decision.side, decision.shares, decision.max_price_cents)
                {
                    balance = balance.map(|b| b - decision.max_cost_cents() as i64);
                    history.push(TradeRecord {
                        timestamp,
                        ticker: report.ticker.clone(),
                        side,
                        shares,
                        price_cents: price,
                        result: TradeResult::Pending,
                        pnl_cents: 0,
                    });
                    carried = Some(OpenPosition {
                        ticker: report.ticker.clone(),
                        side,
                        shares,
                        entry_price_cents: price,
                    });
                }
            }
            CycleOutcome::Entry { .. } => summary.passes += 1,
            CycleOutcome::Exit { signal } => {
                summary.exits += 1;
                if let Some(position) = &input.open_position {
                    balance = balance.map(|b| b + position.cost_basis_cents() + signal.pnl_cents);
                }
                record_exit(&mut history, signal, timestamp);
                realized = Some(signal.pnl_cents);
            }
            CycleOutcome::Hold { .. } => {
                summary.holds += 1;
                carried = input.open_position.clone();
            }
        }

        if let Some(winner) = cycle.settlement {
            let mut settled_any = false;
            for record in history
                .iter_mut()
                .filter(|r| r.ticker == report.ticker && r.result == TradeResult::Pending)
            {
                record.settle(winner);
                balance = balance.map(|b| b + record.cost_cents() + record.pnl_cents);
                *realized.get_or_insert(0) += record.pnl_cents;
                settled_any = true;
            }
            if settled_any {
                carried = None;
            }
        }

        steps.push(ReplayStep {
            index,
            ticker: report.ticker,
            outcome: report.outcome,
            pnl_cents: realized,
        });
    }

    summary.final_balance_cents = balance;
    summary.performance = compute_stats(&history, last_time.date());

    info!(
        buys = summary.buys,
        passes = summary.passes,
        exits = summary.exits,
        stale = summary.stale,
        pnl = %summary.performance.total_pnl_dollars(),
        "Replay complete"
    );

    Ok(ReplayReport {
        steps,
        history,
        summary,
    })
}

/// Mark the pending record behind an exit, or append one when the position
/// predates the history.
fn record_exit(history: &mut Vec<TradeRecord>, signal: &ExitSignal, timestamp: OffsetDateTime) {
    let pending = history.iter_mut().rev().find(|r| {
        r.result == TradeResult::Pending && r.ticker == signal.ticker && r.side == signal.side
    });

    match pending {
        Some(record) => {
            record.result = signal.reason.trade_result();
            record.pnl_cents = signal.pnl_cents;
        }
        None => history.push(TradeRecord {
            timestamp,
            ticker: signal.ticker.clone(),
            side: signal.side,
            shares: signal.shares,
            price_cents: signal.entry_price_cents,
            result: signal.reason.trade_result(),
            pnl_cents: signal.pnl_cents,
        }),
    }
}

/// Write off pending records that never resolved, except the one still held.
fn expire_stale_pending(
    history: &mut [TradeRecord],
    now: OffsetDateTime,
    held: Option<&OpenPosition>,
) -> usize {
    let max_age = Duration::minutes(STALE_PENDING_MINUTES);
    let mut expired = 0;

    for record in history.iter_mut().filter(|r| r.result == TradeResult::Pending) {
        if held.is_some_and(|p| p.ticker == record.ticker) {
            continue;
        }
        let age = now - record.timestamp;
        if age > max_age {
            info!(
                ticker = %record.ticker,
                age_min = age.whole_minutes(),
                "Pending entry never resolved, marking unknown"
            );
            record.result = TradeResult::Unknown;
            expired += 1;
        }
    }

    expired
}
