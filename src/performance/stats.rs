//! Performance statistics computed from trade history.

use rust_decimal::Decimal;
use time::Date;

use super::types::{PerformanceState, TradeRecord};

/// Number of recent settled results kept on the state.
pub const RECENT_RESULTS: usize = 10;

/// Compute statistics over `history` (oldest first).
///
/// Only settled trades (wins, losses and early exits) count. `today` is the
/// UTC date whose trades make up `today_pnl_cents`.
pub fn compute(history: &[TradeRecord], today: Date) -> PerformanceState {
    let settled: Vec<&TradeRecord> = history.iter().filter(|r| r.result.is_settled()).collect();

    let mut state = PerformanceState {
        total_trades: settled.len() as u32,
        ..PerformanceState::default()
    };

    let mut win_total = Decimal::ZERO;
    let mut loss_total = Decimal::ZERO;
    let mut cumulative = 0i64;
    let mut peak = 0i64;

    for record in &settled {
        if record.is_win() {
            state.wins += 1;
            win_total += Decimal::from(record.pnl_cents);
        } else {
            state.losses += 1;
            loss_total += Decimal::from(record.pnl_cents);
        }

        cumulative += record.pnl_cents;
        peak = peak.max(cumulative);
        state.max_drawdown_cents = state.max_drawdown_cents.max(peak - cumulative);

        if record.timestamp.to_offset(time::UtcOffset::UTC).date() == today {
            state.today_pnl_cents += record.pnl_cents;
        }
    }

    state.total_pnl_cents = cumulative;

    if state.total_trades > 0 {
        state.win_rate = Decimal::from(state.wins) / Decimal::from(state.total_trades);
    }
    if state.wins > 0 {
        state.avg_win_cents = (win_total / Decimal::from(state.wins)).round_dp(2);
    }
    if state.losses > 0 {
        state.avg_loss_cents = (loss_total / Decimal::from(state.losses)).round_dp(2);
    }

    state.current_streak = streak(&settled);
    state.recent_results = settled
        .iter()
        .rev()
        .take(RECENT_RESULTS)
        .map(|r| r.result)
        .collect();

    state
}

/// Signed run length of the most recent settled outcomes.
fn streak(settled: &[&TradeRecord]) -> i32 {
    let mut iter = settled.iter().rev();
    let Some(last) = iter.next() else {
        return 0;
    };

    let winning = last.is_win();
    let run = 1 + iter.take_while(|r| r.is_win() == winning).count() as i32;

    if winning {
        run
    } else {
        -run
    }
}
