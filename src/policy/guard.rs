//! Guardrails applied to decisions produced outside the evaluator.
//!
//! A model response that passed schema validation can still break policy:
//! ignore the risk gate, misstate its edge, trade below the minimum, oversize,
//! or bid above the ceiling. `review` corrects or vetoes each of these and
//! reports what it changed.

use serde::Serialize;
use tracing::{instrument, warn};

use super::edge::{best_quote, edge_points, minimum_edge, quote, EdgeTier};
use super::evaluator::DecisionContext;
use crate::config::Config;
use crate::decision::{clamp_edge, clamp_probability, Action, Decision};
use crate::market::Side;
use crate::metrics;
use crate::risk;

/// Largest disagreement (points) tolerated between a stated edge and the
/// edge recomputed from the market.
pub const EDGE_TOLERANCE: i32 = 1;

/// A decision after guardrails, with every correction applied to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reviewed {
    /// Decision to act on.
    pub decision: Decision,
    /// Human-readable description of each override.
    pub overrides: Vec<String>,
}

impl Reviewed {
    /// Whether any guardrail fired.
    pub fn was_overridden(&self) -> bool {
        !self.overrides.is_empty()
    }
}

/// Apply the policy guardrails to an externally produced decision.
#[instrument(skip_all, fields(ticker = %ctx.market.ticker, action = %decision.action))]
pub fn review(decision: Decision, ctx: &DecisionContext, config: &Config) -> Reviewed {
    let mut overrides = Vec::new();
    let decision = apply(decision, ctx, config, &mut overrides);

    if !overrides.is_empty() {
        for o in &overrides {
            warn!(override_reason = %o, "Guardrail override");
        }
        metrics::inc_guard_overrides(overrides.len());
    }

    Reviewed {
        decision,
        overrides,
    }
}

fn apply(
    mut decision: Decision,
    ctx: &DecisionContext,
    config: &Config,
    overrides: &mut Vec<String>,
) -> Decision {
    let limits = config.limits();

    if decision.action == Action::Pass {
        return fill_pass_estimates(decision, ctx, overrides);
    }

    if let Some(veto) = risk::check(&ctx.market, &ctx.performance, ctx.balance_cents, config) {
        metrics::inc_risk_vetoes(veto.label());
        overrides.push(format!("risk gate: {}", veto));
        let pass = decision.into_pass(format!("Risk gate: {}", veto));
        return fill_pass_estimates(pass, ctx, overrides);
    }

    let (Some(side), Some(shares), Some(price)) =
        (decision.side, decision.shares, decision.max_price_cents)
    else {
        overrides.push("BUY missing side, shares or price".to_string());
        return decision.into_pass("Guardrail: incomplete BUY");
    };

    let probability = match decision.estimated_probability {
        Some(p) => p,
        None => {
            let yes = ctx.estimate().yes_points();
            let p = match side {
                Side::Yes => yes,
                Side::No => 100 - yes,
            };
            overrides.push(format!("filled missing probability with {}", p));
            decision.estimated_probability = Some(p);
            p
        }
    };

    let Some(implied) = ctx.market.implied_probability(side) else {
        overrides.push(format!("no ask on {}", side.label()));
        return decision.into_pass(format!("Guardrail: no ask on {}", side.label()));
    };

    let edge = edge_points(probability, implied);
    match decision.estimated_edge {
        Some(stated) if (stated - clamp_edge(edge)).abs() <= EDGE_TOLERANCE => {}
        stated => {
            overrides.push(format!(
                "estimated_edge corrected from {} to {} ({}% vs {}¢ ask)",
                stated.map(|s| s.to_string()).unwrap_or_else(|| "null".to_string()),
                edge,
                probability,
                implied
            ));
            decision.estimated_edge = Some(clamp_edge(edge));
        }
    }

    let streak = ctx.performance.current_streak;
    let minimum = minimum_edge(streak, config);
    let tier = EdgeTier::classify(edge, minimum);
    if tier == EdgeTier::Insufficient {
        overrides.push(format!("edge {} below minimum {}", edge, minimum));
        return decision.into_pass(format!(
            "Guardrail: edge {:+} on {} below minimum {}",
            edge,
            side.label(),
            minimum
        ));
    }

    let on_streak = ctx.performance.on_losing_streak(config.losing_streak_threshold);
    if on_streak {
        let trend = ctx.signal.as_ref().map(|s| s.trend);
        if !trend.is_some_and(|t| t.is_unanimous_for(side)) {
            let trend = trend
                .map(|t| t.to_string())
                .unwrap_or_else(|| "UNAVAILABLE".to_string());
            overrides.push(format!(
                "losing streak {} with trend {} against {}",
                streak,
                trend,
                side.label()
            ));
            return decision.into_pass(format!(
                "Guardrail: losing streak {}, trend {} does not confirm {}",
                streak,
                trend,
                side.label()
            ));
        }
    }

    let mut cap = tier.max_shares().min(limits.max_shares);
    if on_streak {
        cap = cap.min(1);
    }
    let clamped_shares = shares.clamp(1, cap.max(1));
    if clamped_shares != shares {
        overrides.push(format!("shares clamped from {} to {}", shares, clamped_shares));
        decision.shares = Some(clamped_shares);
    }

    let clamped_price = price.clamp(1, limits.max_price_cents);
    if clamped_price != price {
        overrides.push(format!(
            "max_price_cents clamped from {} to {}",
            price, clamped_price
        ));
        decision.max_price_cents = Some(clamped_price);
    }

    decision
}

/// Complete the estimates on a PASS.
///
/// A stated probability is read as P(YES) and priced against the YES ask;
/// with nothing stated, both values come from the better side of the
/// policy's own estimate.
fn fill_pass_estimates(
    mut decision: Decision,
    ctx: &DecisionContext,
    overrides: &mut Vec<String>,
) -> Decision {
    if decision.estimated_probability.is_some() && decision.estimated_edge.is_some() {
        return decision;
    }

    match decision.estimated_probability {
        Some(p) => {
            let edge = quote(&ctx.market, Side::Yes, p).map_or(0, |q| q.edge);
            decision.estimated_edge = Some(clamp_edge(edge));
        }
        None => {
            let yes = ctx.estimate().yes_points();
            let (probability, edge) = best_quote(&ctx.market, yes)
                .map_or((yes, 0), |q| (q.probability, q.edge));
            decision.estimated_probability = Some(clamp_probability(probability));
            decision.estimated_edge.get_or_insert(clamp_edge(edge));
        }
    }

    overrides.push("filled missing estimates on PASS".to_string());
    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MarketSnapshot;
    use crate::performance::PerformanceState;
    use crate::signal::{Momentum, PriceIndicators, TrendAlignment};

    fn ctx(streak: i32, trend: Option<TrendAlignment>) -> DecisionContext {
        DecisionContext {
            market: MarketSnapshot {
                ticker: "KXBTCD-TEST".to_string(),
                yes_bid: Some(44),
                yes_ask: Some(48),
                no_bid: Some(50),
                no_ask: Some(54),
                minutes_to_expiry: Some(10.0),
                ..MarketSnapshot::default()
            },
            signal: trend.map(|trend| PriceIndicators {
                spot_price: 100_000.0,
                pct_change_5m: 0.0,
                pct_change_15m: 0.0,
                pct_change_1h: 0.0,
                momentum: Momentum::Flat,
                trend,
                sma_15m: 100_000.0,
                ema_9: 100_000.0,
                rsi_9: 50.0,
                volatility_1m: 0.0,
                last_3_candles: vec![],
            }),
            performance: PerformanceState {
                current_streak: streak,
                ..PerformanceState::default()
            },
            balance_cents: None,
        }
    }

    #[test]
    fn compliant_buy_is_untouched() {
        let d = Decision::buy(Side::Yes, 2, 48, 62, 14, "up");
        let r = review(d.clone(), &ctx(0, None), &Config::default());
        assert!(!r.was_overridden());
        assert_eq!(r.decision, d);
    }

    #[test]
    fn misstated_edge_is_corrected() {
        let d = Decision::buy(Side::Yes, 1, 48, 62, 20, "up");
        let r = review(d, &ctx(0, None), &Config::default());
        assert_eq!(r.decision.estimated_edge, Some(14));
        assert_eq!(r.decision.action, Action::Buy);
        assert_eq!(r.overrides.len(), 1);
    }

    #[test]
    fn buy_under_minimum_edge_becomes_pass() {
        let d = Decision::buy(Side::Yes, 1, 48, 54, 6, "weak");
        let r = review(d, &ctx(0, None), &Config::default());
        assert_eq!(r.decision.action, Action::Pass);
        assert_eq!(r.decision.estimated_probability, Some(54));
        assert_eq!(r.decision.estimated_edge, Some(6));
    }

    #[test]
    fn oversized_and_overpriced_buy_is_clamped() {
        // Edge 14 allows 2 shares; ceiling 50
        let d = Decision::buy(Side::Yes, 3, 70, 62, 14, "big");
        let r = review(d, &ctx(0, None), &Config::default());
        assert_eq!(r.decision.shares, Some(2));
        assert_eq!(r.decision.max_price_cents, Some(50));
        assert_eq!(r.overrides.len(), 2);
    }

    #[test]
    fn losing_streak_needs_unanimous_trend() {
        let d = Decision::buy(Side::Yes, 2, 48, 62, 14, "up");
        let r = review(d.clone(), &ctx(-3, Some(TrendAlignment::Mixed)), &Config::default());
        assert_eq!(r.decision.action, Action::Pass);

        let r = review(d.clone(), &ctx(-3, None), &Config::default());
        assert_eq!(r.decision.action, Action::Pass);

        let r = review(d, &ctx(-3, Some(TrendAlignment::AllUp)), &Config::default());
        assert_eq!(r.decision.action, Action::Buy);
        assert_eq!(r.decision.shares, Some(1));
    }

    #[test]
    fn pass_without_estimates_is_filled() {
        let d = Decision {
            estimated_probability: None,
            estimated_edge: None,
            ..Decision::pass(50, 0, "nothing")
        };
        let r = review(d, &ctx(0, None), &Config::default());
        assert_eq!(r.decision.estimated_probability, Some(50));
        assert_eq!(r.decision.estimated_edge, Some(2));
        assert!(r.was_overridden());
    }

    #[test]
    fn risk_gate_vetoes_model_buy() {
        let d = Decision::buy(Side::Yes, 2, 48, 62, 14, "up");

        let mut low_balance = ctx(0, None);
        low_balance.balance_cents = Some(100);

        let mut daily_loss = ctx(0, None);
        daily_loss.performance.today_pnl_cents = -1_000;

        let mut near_expiry = ctx(0, None);
        near_expiry.market.minutes_to_expiry = Some(1.5);

        for c in [low_balance, daily_loss, near_expiry] {
            let r = review(d.clone(), &c, &Config::default());
            assert_eq!(r.decision.action, Action::Pass);
            assert!(r.decision.reasoning.starts_with("Risk gate"));
            assert_eq!(r.decision.estimated_probability, Some(62));
            assert_eq!(r.decision.estimated_edge, Some(14));
            assert_eq!(r.overrides.len(), 1);
            assert!(r.overrides[0].starts_with("risk gate"));
        }
    }

    #[test]
    fn pass_edge_follows_stated_probability() {
        let d = Decision {
            estimated_probability: Some(70),
            estimated_edge: None,
            ..Decision::pass(50, 0, "skip")
        };
        let r = review(d, &ctx(0, None), &Config::default());
        assert_eq!(r.decision.estimated_probability, Some(70));
        assert_eq!(r.decision.estimated_edge, Some(22));
    }

    #[test]
    fn pass_estimates_come_from_better_side() {
        let mut c = ctx(0, None);
        c.market.no_bid = Some(30);
        c.market.no_ask = Some(34);
        let d = Decision {
            estimated_probability: None,
            estimated_edge: None,
            ..Decision::pass(50, 0, "skip")
        };
        // NO at 50% against a 34¢ ask beats YES at 50% against 48¢
        let r = review(d, &c, &Config::default());
        assert_eq!(r.decision.estimated_probability, Some(50));
        assert_eq!(r.decision.estimated_edge, Some(16));
    }

    #[test]
    fn edge_beyond_wire_range_is_not_flagged() {
        let mut c = ctx(0, None);
        c.market.yes_bid = Some(28);
        c.market.yes_ask = Some(30);
        // True edge 65 is carried as 50
        let d = Decision::buy(Side::Yes, 1, 30, 95, 65, "strong");
        assert_eq!(d.estimated_edge, Some(50));

        let r = review(d.clone(), &c, &Config::default());
        assert!(!r.was_overridden(), "{:?}", r.overrides);
        assert_eq!(r.decision, d);
    }
}
