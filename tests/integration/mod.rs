//! Integration tests for the Kalshi Up/Down decision policy.
//!
//! These run whole cycles through the public API: the evaluator over a grid of
//! markets, signals and streaks, model-response review, and replay.

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use kalshi_updown::config::Config;
use kalshi_updown::decision::{self, Action, Decision};
use kalshi_updown::engine::{review_response, run_cycle, CycleInput, CycleOutcome};
use kalshi_updown::market::{MarketSnapshot, Side};
use kalshi_updown::performance::PerformanceState;
use kalshi_updown::policy::edge::quote;
use kalshi_updown::policy::{
    best_quote, kelly_shares, minimum_edge, DecisionContext, EdgeTier, PolicyEvaluator,
};
use kalshi_updown::replay::{replay, ReplayCycle};
use kalshi_updown::signal::{Momentum, PriceIndicators, TrendAlignment};

fn indicators(pct_15m: f64, trend: TrendAlignment, rsi: f64, ema_gap: f64) -> PriceIndicators {
    let spot = 100_000.0;
    PriceIndicators {
        spot_price: spot,
        pct_change_5m: 0.0,
        pct_change_15m: pct_15m,
        pct_change_1h: 0.0,
        momentum: Momentum::Flat,
        trend,
        sma_15m: spot,
        ema_9: spot / (1.0 + ema_gap / 100.0),
        rsi_9: rsi,
        volatility_1m: 0.02,
        last_3_candles: vec![],
    }
}

/// Signals from strongly bearish to strongly bullish, plus unavailable.
fn signals() -> Vec<Option<PriceIndicators>> {
    vec![
        None,
        Some(indicators(0.3, TrendAlignment::AllUp, 75.0, 0.2)),
        Some(indicators(-0.3, TrendAlignment::AllDown, 25.0, -0.2)),
        Some(indicators(0.3, TrendAlignment::Mixed, 55.0, 0.2)),
        Some(indicators(0.1, TrendAlignment::AllUp, 50.0, 0.0)),
        Some(indicators(0.0, TrendAlignment::AllFlat, 50.0, 0.0)),
    ]
}

fn market(yes_ask: u32, no_ask: u32, spread: u32) -> MarketSnapshot {
    MarketSnapshot {
        ticker: "KXBTC15M-GRID".to_string(),
        yes_bid: Some(yes_ask - spread),
        yes_ask: Some(yes_ask),
        no_bid: Some(no_ask - spread),
        no_ask: Some(no_ask),
        minutes_to_expiry: Some(10.0),
        ..MarketSnapshot::default()
    }
}

/// Every context in the grid.
fn grid() -> Vec<DecisionContext> {
    let mut contexts = Vec::new();
    for yes_ask in (25..=75).step_by(5) {
        for extra in [1, 4, 10] {
            for spread in [2, 14] {
                for signal in signals() {
                    for streak in [2, 0, -2, -3, -5] {
                        contexts.push(DecisionContext {
                            market: market(yes_ask, 100 - yes_ask + extra, spread),
                            signal: signal.clone(),
                            performance: PerformanceState {
                                current_streak: streak,
                                ..PerformanceState::default()
                            },
                            balance_cents: Some(10_000),
                        });
                    }
                }
            }
        }
    }
    contexts
}

#[test]
fn edge_below_minimum_always_passes() {
    let config = Config::default();
    let evaluator = PolicyEvaluator::new(config.clone());

    for ctx in grid() {
        let d = evaluator.evaluate(&ctx);
        let quote = best_quote(&ctx.market, ctx.estimate().yes_points()).unwrap();
        if quote.edge < minimum_edge(ctx.performance.current_streak, &config) {
            assert_eq!(d.action, Action::Pass, "{:?}", ctx.market);
        }
    }
}

#[test]
fn buys_respect_price_ceiling_and_share_bounds() {
    let evaluator = PolicyEvaluator::new(Config::default());
    let mut buys = 0;

    for ctx in grid() {
        let d = evaluator.evaluate(&ctx);
        if d.is_buy() {
            buys += 1;
            let price = d.max_price_cents.unwrap();
            assert!((1..=50).contains(&price), "price {}", price);
            assert!((1..=3).contains(&d.shares.unwrap()));
            assert!(d.side.is_some());
        } else {
            assert_eq!((d.side, d.shares, d.max_price_cents), (None, None, None));
        }
    }

    assert!(buys > 0);
}

#[test]
fn estimates_present_and_in_range_on_every_decision() {
    let evaluator = PolicyEvaluator::new(Config::default());

    for ctx in grid() {
        let d = evaluator.evaluate(&ctx);
        let p = d.estimated_probability.unwrap();
        let e = d.estimated_edge.unwrap();
        assert!((1..=99).contains(&p));
        assert!((-50..=50).contains(&e));
        assert!(decision::validate(&d, &Config::default().limits()).is_ok());
    }
}

#[test]
fn losing_streak_caps_shares_and_requires_alignment() {
    let evaluator = PolicyEvaluator::new(Config::default());
    let mut streak_buys = 0;

    for ctx in grid().into_iter().filter(|c| c.performance.current_streak <= -3) {
        let d = evaluator.evaluate(&ctx);
        if d.is_buy() {
            streak_buys += 1;
            assert_eq!(d.shares, Some(1));
            assert!(d.estimated_edge.unwrap() >= 12);
            let trend = ctx.signal.as_ref().map(|s| s.trend).unwrap();
            assert!(trend.is_unanimous_for(d.side.unwrap()));
        }
    }

    assert!(streak_buys > 0);
}

#[test]
fn buy_edge_matches_probability_minus_ask() {
    let evaluator = PolicyEvaluator::new(Config::default());

    for ctx in grid() {
        let d = evaluator.evaluate(&ctx);
        if let Some(side) = d.side {
            let implied = ctx.market.implied_probability(side).unwrap() as i32;
            let stated = d.estimated_probability.unwrap() as i32;
            assert!((d.estimated_edge.unwrap() - (stated - implied)).abs() <= 1);
        }
    }
}

#[test]
fn sixty_two_percent_against_forty_eight_cents() {
    let m = market(48, 54, 2);
    let q = quote(&m, Side::Yes, 62).unwrap();
    assert_eq!(q.edge, 14);

    let tier = EdgeTier::classify(q.edge, 8);
    assert_eq!(tier, EdgeTier::Solid);

    let shares = kelly_shares(dec!(0.62), 48, dec!(0.5), tier.max_shares());
    assert!((1..=2).contains(&shares));
    // Half Kelly at 62% / 48¢ is 0.135, so the tier floor of 1 applies
    assert_eq!(shares, 1);
}

#[test]
fn model_response_review_end_to_end() {
    let input = CycleInput {
        market: market(48, 54, 2),
        balance_cents: Some(5_000),
        ..CycleInput::default()
    };
    let raw = "Trend is up, book is bid.\n```json\n{\"action\":\"BUY\",\"side\":\"yes\",\"shares\":3,\"max_price_cents\":48,\"estimated_probability\":62,\"estimated_edge\":10,\"reasoning\":\"momentum\"}\n```";

    let report = review_response(&input, raw, &Config::default()).unwrap();

    assert_eq!(
        report.decision,
        Decision {
            action: Action::Buy,
            side: Some(Side::Yes),
            shares: Some(2),
            max_price_cents: Some(48),
            estimated_probability: Some(62),
            estimated_edge: Some(14),
            reasoning: "momentum".to_string(),
        }
    );
    assert_eq!(report.overrides.len(), 2);
}

#[test]
fn evaluate_cycle_from_json() {
    let json = r#"{
        "market": {
            "ticker": "KXBTC15M-25MAR011415",
            "yes_bid": 30, "yes_ask": 32, "no_bid": 66, "no_ask": 70,
            "minutes_to_expiry": 8.5,
            "orderbook": { "yes": [[30, 400], [29, 250]], "no": [[66, 20]] }
        },
        "balance_cents": 4200,
        "as_of": "2025-03-01T14:07:00Z"
    }"#;
    let input = CycleInput::from_json(json).unwrap();
    let report = run_cycle(&input, &Config::default()).unwrap();

    // Book pressure lifts YES to 53: edge 21 on a 2¢ spread
    let d = report.decision().unwrap();
    assert_eq!(d.action, Action::Buy);
    assert_eq!(d.side, Some(Side::Yes));
    assert_eq!(d.max_price_cents, Some(32));
    assert_eq!(d.estimated_probability, Some(53));
    assert_eq!(d.estimated_edge, Some(21));
}

#[test]
fn replay_feeds_losses_into_risk_gate() {
    let cycle = r#"{
        "market": {
            "ticker": "KXBTC15M-R",
            "yes_bid": 30, "yes_ask": 32, "no_bid": 66, "no_ask": 70,
            "minutes_to_expiry": 8.5,
            "orderbook": { "yes": [[30, 400]], "no": [[66, 20]] }
        },
        "balance_cents": 560,
        "as_of": "2025-03-01T14:07:00Z",
        "settlement": "no"
    }"#;
    let json = format!("[{}]", vec![cycle; 6].join(","));
    let cycles: Vec<ReplayCycle> = serde_json::from_str(&json).unwrap();

    let report = replay(&cycles, &Config::default()).unwrap();
    let summary = &report.summary;

    // Each loss costs 32¢; two losses take the balance under 500 and the gate
    // vetoes every later cycle.
    assert_eq!(summary.buys, 2);
    assert_eq!(summary.passes, 4);
    assert_eq!(summary.performance.losses, 2);
    assert_eq!(summary.performance.current_streak, -2);
    let last = report.steps.last().unwrap();
    match &last.outcome {
        CycleOutcome::Entry { decision } => {
            assert_eq!(decision.action, Action::Pass);
            assert!(decision.reasoning.starts_with("Risk gate"));
        }
        other => panic!("expected entry, got {:?}", other),
    }
    assert_eq!(summary.final_balance_cents, Some(496));
    assert!(summary.performance.total_pnl_dollars() < Decimal::ZERO);
}
