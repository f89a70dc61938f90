//! Risk gate evaluated before the decision policy.

use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::market::MarketSnapshot;
use crate::performance::PerformanceState;

/// Reason a cycle is not allowed to trade at all.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskVeto {
    /// Account balance under the floor.
    #[error("balance {balance}¢ < {minimum}¢ minimum")]
    LowBalance {
        /// Current balance.
        balance: u64,
        /// Configured floor.
        minimum: u64,
    },

    /// Daily loss limit reached.
    #[error("daily loss {pnl}¢ reached limit of -{limit}¢")]
    DailyLoss {
        /// Today's P&L.
        pnl: i64,
        /// Configured limit.
        limit: i64,
    },

    /// Too many consecutive losses.
    #[error("{losses} consecutive losses (limit {limit})")]
    LosingStreak {
        /// Losses in a row.
        losses: u32,
        /// Configured limit.
        limit: u32,
    },

    /// Market closes too soon for a new entry.
    #[error("{minutes:.1}min to expiry < {minimum:.1}min minimum")]
    NearExpiry {
        /// Minutes left.
        minutes: f64,
        /// Configured minimum.
        minimum: f64,
    },

    /// Neither side can be bought.
    #[error("no ask on either side")]
    NoQuotes,
}

impl RiskVeto {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RiskVeto::LowBalance { .. } => "low_balance",
            RiskVeto::DailyLoss { .. } => "daily_loss",
            RiskVeto::LosingStreak { .. } => "losing_streak",
            RiskVeto::NearExpiry { .. } => "near_expiry",
            RiskVeto::NoQuotes => "no_quotes",
        }
    }
}

/// Run every gate; the first failure wins.
///
/// An unknown balance or expiry skips that gate.
pub fn check(
    market: &MarketSnapshot,
    performance: &PerformanceState,
    balance_cents: Option<u64>,
    config: &Config,
) -> Option<RiskVeto> {
    let veto = check_inner(market, performance, balance_cents, config);
    if let Some(ref v) = veto {
        info!(ticker = %market.ticker, reason = v.label(), "Risk veto: {}", v);
    }
    veto
}

fn check_inner(
    market: &MarketSnapshot,
    performance: &PerformanceState,
    balance_cents: Option<u64>,
    config: &Config,
) -> Option<RiskVeto> {
    if let Some(balance) = balance_cents {
        if balance < config.min_balance_cents {
            return Some(RiskVeto::LowBalance {
                balance,
                minimum: config.min_balance_cents,
            });
        }
    }

    if performance.today_pnl_cents <= -config.max_daily_loss_cents {
        return Some(RiskVeto::DailyLoss {
            pnl: performance.today_pnl_cents,
            limit: config.max_daily_loss_cents,
        });
    }

    if performance.current_streak <= -(config.max_consecutive_losses as i32) {
        return Some(RiskVeto::LosingStreak {
            losses: performance.current_streak.unsigned_abs(),
            limit: config.max_consecutive_losses,
        });
    }

    if let Some(minutes) = market.minutes_to_expiry {
        if minutes < config.min_minutes_to_expiry {
            return Some(RiskVeto::NearExpiry {
                minutes,
                minimum: config.min_minutes_to_expiry,
            });
        }
    }

    if !market.has_quotes() {
        return Some(RiskVeto::NoQuotes);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market() -> MarketSnapshot {
        MarketSnapshot {
            ticker: "T".to_string(),
            yes_ask: Some(48),
            no_ask: Some(54),
            minutes_to_expiry: Some(10.0),
            ..MarketSnapshot::default()
        }
    }

    #[test]
    fn healthy_cycle_passes_gate() {
        let veto = check(&market(), &PerformanceState::default(), Some(10_000), &Config::default());
        assert_eq!(veto, None);
    }

    #[test]
    fn low_balance_vetoes() {
        let veto = check(&market(), &PerformanceState::default(), Some(499), &Config::default());
        assert!(matches!(veto, Some(RiskVeto::LowBalance { balance: 499, .. })));
        // Unknown balance skips the gate
        assert_eq!(check(&market(), &PerformanceState::default(), None, &Config::default()), None);
    }

    #[test]
    fn daily_loss_vetoes_at_limit() {
        let perf = PerformanceState {
            today_pnl_cents: -1000,
            ..PerformanceState::default()
        };
        let veto = check(&market(), &perf, None, &Config::default());
        assert_eq!(veto.as_ref().map(|v| v.label()), Some("daily_loss"));

        let perf = PerformanceState {
            today_pnl_cents: -999,
            ..PerformanceState::default()
        };
        assert_eq!(check(&market(), &perf, None, &Config::default()), None);
    }

    #[test]
    fn long_losing_streak_vetoes() {
        let perf = PerformanceState {
            current_streak: -7,
            ..PerformanceState::default()
        };
        let veto = check(&market(), &perf, None, &Config::default()).unwrap();
        assert_eq!(veto, RiskVeto::LosingStreak { losses: 7, limit: 7 });
        assert_eq!(veto.to_string(), "7 consecutive losses (limit 7)");
    }

    #[test]
    fn near_expiry_and_missing_quotes_veto() {
        let mut m = market();
        m.minutes_to_expiry = Some(1.5);
        let veto = check(&m, &PerformanceState::default(), None, &Config::default());
        assert_eq!(veto.as_ref().map(|v| v.label()), Some("near_expiry"));

        let unquoted = MarketSnapshot {
            ticker: "T".to_string(),
            ..MarketSnapshot::default()
        };
        let veto = check(&unquoted, &PerformanceState::default(), None, &Config::default());
        assert_eq!(veto, Some(RiskVeto::NoQuotes));
    }
}
