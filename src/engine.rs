//! One decision cycle: normalize inputs, then either manage the open position
//! or evaluate a new entry.

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::decision::{self, extract_json, parse_response, Decision};
use crate::error::Result;
use crate::market::MarketSnapshot;
use crate::metrics;
use crate::performance::{compute_stats, PerformanceState, TradeRecord};
use crate::policy::{review, DecisionContext, PolicyEvaluator};
use crate::signal::{compute_indicators, PriceFeed};
use crate::trading::{check_exit, ExitSignal, OpenPosition};

/// Inputs for one cycle, as read from a JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleInput {
    /// Market quotes and depth.
    pub market: MarketSnapshot,
    /// Raw spot data; absent when the price feed was down.
    #[serde(default)]
    pub price_feed: Option<PriceFeed>,
    /// Trade history, oldest first.
    #[serde(default)]
    pub history: Vec<TradeRecord>,
    /// Precomputed performance; derived from `history` when absent.
    #[serde(default)]
    pub performance: Option<PerformanceState>,
    /// Account balance in cents, if known.
    #[serde(default)]
    pub balance_cents: Option<u64>,
    /// Position carried from an earlier cycle.
    #[serde(default)]
    pub open_position: Option<OpenPosition>,
    /// Evaluation time; defaults to now.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub as_of: Option<OffsetDateTime>,
}

impl CycleInput {
    /// Parse a cycle from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Evaluation time in UTC.
    pub fn timestamp(&self) -> OffsetDateTime {
        self.as_of
            .unwrap_or_else(OffsetDateTime::now_utc)
            .to_offset(UtcOffset::UTC)
    }

    /// Build the policy context: indicators from the feed, performance from
    /// history unless supplied.
    pub fn context(&self) -> DecisionContext {
        let signal = self.price_feed.as_ref().and_then(compute_indicators);
        let performance = match &self.performance {
            Some(p) => p.clone(),
            None => compute_stats(&self.history, self.timestamp().date()),
        };

        DecisionContext {
            market: self.market.clone(),
            signal,
            performance,
            balance_cents: self.balance_cents,
        }
    }

    /// Open position on this cycle's market, if any.
    pub fn position_on_market(&self) -> Option<&OpenPosition> {
        self.open_position
            .as_ref()
            .filter(|p| p.ticker == self.market.ticker)
    }
}

/// What a cycle produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// Entry decision (BUY or PASS).
    Entry {
        /// The decision.
        decision: Decision,
    },
    /// Close the open position.
    Exit {
        /// Exit instruction.
        signal: ExitSignal,
    },
    /// Keep holding; no entry is evaluated while a position is open.
    Hold {
        /// Unrealized P&L per share, when a bid exists.
        unrealized_pnl_per_share: Option<i32>,
    },
}

/// Result of [`run_cycle`].
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// Market ticker.
    pub ticker: String,
    /// Outcome.
    #[serde(flatten)]
    pub outcome: CycleOutcome,
    /// Performance the cycle was evaluated with.
    pub performance: PerformanceState,
}

impl CycleReport {
    /// Entry decision, if the cycle evaluated one.
    pub fn decision(&self) -> Option<&Decision> {
        match &self.outcome {
            CycleOutcome::Entry { decision } => Some(decision),
            _ => None,
        }
    }
}

/// Run one decision cycle.
#[instrument(skip_all, fields(ticker = %input.market.ticker))]
pub fn run_cycle(input: &CycleInput, config: &Config) -> Result<CycleReport> {
    input.market.validate()?;
    let ctx = input.context();

    if ctx.signal.is_none() {
        debug!("No price signal, using market-only analysis");
    }

    let outcome = match input.position_on_market() {
        Some(position) => match check_exit(position, &input.market, config) {
            Some(signal) => CycleOutcome::Exit { signal },
            None => {
                let pnl = position.unrealized_pnl_per_share(&input.market);
                info!(
                    side = %position.side,
                    shares = position.shares,
                    entry = position.entry_price_cents,
                    unrealized = ?pnl,
                    "Holding position, skipping entry"
                );
                CycleOutcome::Hold {
                    unrealized_pnl_per_share: pnl,
                }
            }
        },
        None => CycleOutcome::Entry {
            decision: PolicyEvaluator::new(config.clone()).evaluate(&ctx),
        },
    };

    Ok(CycleReport {
        ticker: input.market.ticker.clone(),
        outcome,
        performance: ctx.performance,
    })
}

/// A model response after parsing, schema validation and guardrails.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewReport {
    /// Decision to act on.
    pub decision: Decision,
    /// Guardrail corrections applied.
    pub overrides: Vec<String>,
    /// Why the response was rejected outright, if it was.
    pub rejection: Option<String>,
    /// What the deterministic policy decides for the same cycle.
    pub policy: Decision,
}

/// Validate and guard a raw model response for a cycle.
///
/// Malformed or out-of-schema responses are replaced by a PASS carrying the
/// policy's own estimates. A BUY on a market where a position is already
/// held becomes a PASS.
#[instrument(skip_all, fields(ticker = %input.market.ticker))]
pub fn review_response(input: &CycleInput, raw: &str, config: &Config) -> Result<ReviewReport> {
    input.market.validate()?;
    let ctx = input.context();
    let policy = PolicyEvaluator::new(config.clone()).evaluate(&ctx);

    let parsed = if extract_json(raw).is_some() {
        parse_response(raw).and_then(|d| decision::validate(&d, &config.limits()).map(|_| d))
    } else {
        parse_response(raw)
    };

    let model = match parsed {
        Ok(d) => d,
        Err(e) => {
            warn!(error = %e, "Rejecting model response");
            let decision = policy
                .clone()
                .into_pass(format!("rejected model response: {}", e));
            return Ok(ReviewReport {
                decision,
                overrides: Vec::new(),
                rejection: Some(e.to_string()),
                policy,
            });
        }
    };

    let mut overrides = Vec::new();
    let model = match input.position_on_market() {
        Some(position) if model.is_buy() => {
            let reason = format!(
                "holding {} {} on {}",
                position.shares,
                position.side.label(),
                position.ticker
            );
            warn!(override_reason = %reason, "Guardrail override");
            metrics::inc_guard_overrides(1);
            let pass = model.into_pass(format!("Guardrail: {}, no new entry", reason));
            overrides.push(reason);
            pass
        }
        _ => model,
    };

    let reviewed = review(model, &ctx, config);
    overrides.extend(reviewed.overrides);
    Ok(ReviewReport {
        decision: reviewed.decision,
        overrides,
        rejection: None,
        policy,
    })
}
