//! Deterministic decision policy.
//!
//! Every cycle is evaluated from scratch: the evaluator holds configuration
//! only, never state from earlier cycles.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::edge::{best_quote, minimum_edge, EdgeQuote, EdgeTier};
use super::pricing::{entry_price, PriceMode};
use super::revision::PolicyLimits;
use super::sizing::kelly_shares;
use crate::config::Config;
use crate::decision::Decision;
use crate::market::MarketSnapshot;
use crate::metrics;
use crate::performance::PerformanceState;
use crate::risk;
use crate::signal::{estimate_yes_probability, PriceIndicators, ProbabilityEstimate};

/// Everything one decision depends on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionContext {
    /// Market quotes and depth.
    pub market: MarketSnapshot,
    /// Spot-price indicators; `None` when price data was unavailable.
    #[serde(default)]
    pub signal: Option<PriceIndicators>,
    /// Trading record so far.
    #[serde(default)]
    pub performance: PerformanceState,
    /// Account balance in cents, if known.
    #[serde(default)]
    pub balance_cents: Option<u64>,
}

impl DecisionContext {
    /// YES probability estimate for this context.
    pub fn estimate(&self) -> ProbabilityEstimate {
        estimate_yes_probability(self.signal.as_ref(), &self.market.orderbook)
    }
}

/// Applies the threshold, streak, spread and ceiling rules.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    config: Config,
    limits: PolicyLimits,
}

impl PolicyEvaluator {
    /// Create an evaluator for the given configuration.
    pub fn new(config: Config) -> Self {
        let limits = config.limits();
        Self { config, limits }
    }

    /// Configuration in force.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Effective bounds on any decision.
    pub fn limits(&self) -> PolicyLimits {
        self.limits
    }

    /// Evaluate one cycle.
    #[instrument(
        skip(self, ctx),
        fields(ticker = %ctx.market.ticker, streak = ctx.performance.current_streak)
    )]
    pub fn evaluate(&self, ctx: &DecisionContext) -> Decision {
        let _timer = metrics::timer_evaluation();

        let decision = self.decide(ctx);

        metrics::inc_decisions(decision.action);
        info!(
            action = %decision.action,
            side = ?decision.side,
            shares = ?decision.shares,
            price = ?decision.max_price_cents,
            probability = ?decision.estimated_probability,
            edge = ?decision.estimated_edge,
            "Decision: {}",
            decision.reasoning
        );

        decision
    }

    fn decide(&self, ctx: &DecisionContext) -> Decision {
        let config = &self.config;
        let estimate = ctx.estimate();
        let yes_points = estimate.yes_points();
        let summary = estimate.narrative();
        let quote = best_quote(&ctx.market, yes_points);

        debug!(yes_probability = yes_points, quote = ?quote, "{}", summary);

        if let Some(veto) = risk::check(&ctx.market, &ctx.performance, ctx.balance_cents, config) {
            metrics::inc_risk_vetoes(veto.label());
            let (probability, edge) = pass_estimates(yes_points, quote.as_ref());
            return Decision::pass(probability, edge, format!("Risk gate: {}", veto));
        }

        let Some(quote) = quote else {
            return Decision::pass(yes_points, 0, "No ask on either side");
        };

        let streak = ctx.performance.current_streak;
        let on_streak = ctx.performance.on_losing_streak(config.losing_streak_threshold);
        let minimum = minimum_edge(streak, config);
        let tier = EdgeTier::classify(quote.edge, minimum);

        if tier == EdgeTier::Insufficient {
            return Decision::pass(
                quote.probability,
                quote.edge,
                format!(
                    "Edge {:+} on {} below minimum {} | {}",
                    quote.edge,
                    quote.side.label(),
                    minimum,
                    summary
                ),
            );
        }

        if on_streak {
            match estimate.trend {
                None => {
                    return Decision::pass(
                        quote.probability,
                        quote.edge,
                        format!(
                            "Losing streak {}: trend alignment unavailable, cannot confirm {}",
                            streak,
                            quote.side.label()
                        ),
                    );
                }
                Some(trend) if !trend.is_unanimous_for(quote.side) => {
                    return Decision::pass(
                        quote.probability,
                        quote.edge,
                        format!(
                            "Losing streak {}: trend {} does not confirm {}",
                            streak,
                            trend,
                            quote.side.label()
                        ),
                    );
                }
                Some(_) => {}
            }
        }

        let Some(entry) = entry_price(&ctx.market, quote.side, quote.edge, config) else {
            return Decision::pass(quote.probability, quote.edge, "No ask on chosen side");
        };

        if entry.price_cents > self.limits.max_price_cents {
            return Decision::pass(
                quote.probability,
                quote.edge,
                format!(
                    "Entry {}¢ on {} above {}¢ ceiling (edge {:+})",
                    entry.price_cents,
                    quote.side.label(),
                    self.limits.max_price_cents,
                    quote.edge
                ),
            );
        }

        let mut cap = tier.max_shares().min(self.limits.max_shares);
        if on_streak {
            cap = cap.min(1);
        }

        let win_probability = Decimal::from(quote.probability) / Decimal::ONE_HUNDRED;
        let shares = kelly_shares(win_probability, entry.price_cents, config.kelly_fraction, cap);
        if shares == 0 {
            return Decision::pass(quote.probability, quote.edge, "Share cap is zero");
        }

        let pricing = match entry.mode {
            PriceMode::Aggressive => format!("at ask {}¢", entry.price_cents),
            PriceMode::Passive => format!(
                "passive {}¢ (spread {}¢)",
                entry.price_cents,
                entry.spread_cents.unwrap_or_default()
            ),
        };

        Decision::buy(
            quote.side,
            shares,
            entry.price_cents,
            quote.probability,
            quote.edge,
            format!(
                "{} {}x {}: prob {}% vs implied {}%, edge {:+} ({:?}) | {}",
                quote.side.label(),
                shares,
                pricing,
                quote.probability,
                quote.implied,
                quote.edge,
                tier,
                summary
            ),
        )
    }
}

/// Probability and edge reported on a PASS with no tradable side chosen.
fn pass_estimates(yes_points: u32, quote: Option<&EdgeQuote>) -> (u32, i32) {
    match quote {
        Some(q) => (q.probability, q.edge),
        None => (yes_points, 0),
    }
}
