//! Probability estimate for YES built from indicators and book pressure.

use serde::Serialize;

use super::types::{PriceIndicators, TrendAlignment};
use crate::orderbook::{orderbook_imbalance, Orderbook};

/// Starting probability (points) for YES before any adjustment.
pub const BASE_PROBABILITY: f64 = 50.0;

/// Lowest probability the estimate will ever claim.
pub const MIN_PROBABILITY: f64 = 5.0;

/// Highest probability the estimate will ever claim.
pub const MAX_PROBABILITY: f64 = 95.0;

/// RSI classification used in the narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RsiZone {
    /// RSI above 70.
    Overbought,
    /// RSI below 30.
    Oversold,
    /// Anything in between.
    Neutral,
}

impl std::fmt::Display for RsiZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RsiZone::Overbought => "OVERBOUGHT (>70)",
            RsiZone::Oversold => "OVERSOLD (<30)",
            RsiZone::Neutral => "NEUTRAL",
        };
        f.write_str(label)
    }
}

/// YES probability estimate with the contributions that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct ProbabilityEstimate {
    /// Estimated probability of YES, in points (5..=95).
    pub yes_probability: f64,
    /// Trend alignment, when price data was available.
    pub trend: Option<TrendAlignment>,
    /// RSI zone, when price data was available.
    pub rsi_zone: Option<RsiZone>,
    /// Orderbook imbalance ratio.
    pub imbalance: f64,
    /// Whether the estimate fell back to orderbook-only analysis.
    pub market_only: bool,
    /// Named adjustments applied to the base probability.
    pub adjustments: Vec<(&'static str, f64)>,
}

impl ProbabilityEstimate {
    /// YES probability rounded to whole points, clamped to 1..=99.
    pub fn yes_points(&self) -> u32 {
        self.yes_probability.round().clamp(1.0, 99.0) as u32
    }

    /// One-line summary for logs and prompts.
    pub fn narrative(&self) -> String {
        let trend = self
            .trend
            .map(|t| t.to_string())
            .unwrap_or_else(|| "UNAVAILABLE".to_string());
        let rsi = self
            .rsi_zone
            .map(|z| z.to_string())
            .unwrap_or_else(|| "UNAVAILABLE".to_string());
        let adjustments = if self.adjustments.is_empty() {
            "none".to_string()
        } else {
            self.adjustments
                .iter()
                .map(|(name, delta)| format!("{} {:+.0}", name, delta))
                .collect::<Vec<_>>()
                .join(", ")
        };

        format!(
            "Trend: {} | RSI: {} | OB imbalance: {:.2} | Est. prob YES: {:.0}% | Adjustments: {}{}",
            trend,
            rsi,
            self.imbalance,
            self.yes_probability,
            adjustments,
            if self.market_only { " | market-only" } else { "" },
        )
    }
}

/// Build the YES probability estimate.
///
/// Without indicators only the orderbook contributes.
pub fn estimate_yes_probability(
    indicators: Option<&PriceIndicators>,
    orderbook: &Orderbook,
) -> ProbabilityEstimate {
    let mut adjustments: Vec<(&'static str, f64)> = Vec::new();
    let mut trend = None;
    let mut rsi_zone = None;

    if let Some(ind) = indicators {
        let momentum = if ind.pct_change_15m > 0.15 {
            8.0
        } else if ind.pct_change_15m < -0.15 {
            -8.0
        } else if ind.pct_change_15m > 0.05 {
            3.0
        } else if ind.pct_change_15m < -0.05 {
            -3.0
        } else {
            0.0
        };
        if momentum != 0.0 {
            adjustments.push(("momentum", momentum));
        }

        match ind.trend {
            TrendAlignment::AllUp => adjustments.push(("trend", 6.0)),
            TrendAlignment::AllDown => adjustments.push(("trend", -6.0)),
            TrendAlignment::AllFlat | TrendAlignment::Mixed => {}
        }
        trend = Some(ind.trend);

        let ema_gap = ind.ema_gap_pct();
        if ema_gap > 0.05 {
            adjustments.push(("ema", 3.0));
        } else if ema_gap < -0.05 {
            adjustments.push(("ema", -3.0));
        }

        // Short-horizon RSI extremes read as continuation, not reversal.
        let zone = if ind.rsi_9 > 70.0 {
            adjustments.push(("rsi", 4.0));
            RsiZone::Overbought
        } else if ind.rsi_9 < 30.0 {
            adjustments.push(("rsi", -4.0));
            RsiZone::Oversold
        } else {
            RsiZone::Neutral
        };
        rsi_zone = Some(zone);
    }

    let imbalance = orderbook_imbalance(orderbook);
    if imbalance > 2.0 {
        adjustments.push(("orderbook", 3.0));
    } else if imbalance < 0.5 {
        adjustments.push(("orderbook", -3.0));
    }

    let yes_probability = (BASE_PROBABILITY + adjustments.iter().map(|(_, d)| d).sum::<f64>())
        .clamp(MIN_PROBABILITY, MAX_PROBABILITY);

    ProbabilityEstimate {
        yes_probability,
        trend,
        rsi_zone,
        imbalance,
        market_only: indicators.is_none(),
        adjustments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orderbook::PriceLevel;
    use crate::signal::types::Momentum;

    fn indicators(pct_15m: f64, trend: TrendAlignment, rsi: f64, ema_9: f64) -> PriceIndicators {
        PriceIndicators {
            spot_price: 100_000.0,
            pct_change_5m: 0.0,
            pct_change_15m: pct_15m,
            pct_change_1h: 0.0,
            momentum: Momentum::Flat,
            trend,
            sma_15m: 100_000.0,
            ema_9,
            rsi_9: rsi,
            volatility_1m: 0.0,
            last_3_candles: vec![],
        }
    }

    #[test]
    fn neutral_inputs_give_base_probability() {
        let ind = indicators(0.0, TrendAlignment::AllFlat, 50.0, 100_000.0);
        let est = estimate_yes_probability(Some(&ind), &Orderbook::default());
        assert_eq!(est.yes_probability, 50.0);
        assert!(est.adjustments.is_empty());
        assert!(!est.market_only);
    }

    #[test]
    fn bullish_inputs_stack() {
        // momentum +8, trend +6, ema +3, rsi +4
        let ind = indicators(0.3, TrendAlignment::AllUp, 75.0, 99_000.0);
        let est = estimate_yes_probability(Some(&ind), &Orderbook::default());
        assert_eq!(est.yes_probability, 71.0);
        assert_eq!(est.yes_points(), 71);
        assert_eq!(est.rsi_zone, Some(RsiZone::Overbought));
    }

    #[test]
    fn bearish_inputs_stack_and_clamp() {
        let ind = indicators(-0.1, TrendAlignment::AllDown, 20.0, 101_000.0);
        let book = Orderbook {
            yes: vec![PriceLevel::new(30, 1)],
            no: vec![PriceLevel::new(60, 50)],
        };
        // momentum -3, trend -6, ema -3, rsi -4, orderbook -3
        let est = estimate_yes_probability(Some(&ind), &book);
        assert_eq!(est.yes_probability, 31.0);
        assert!(est.narrative().contains("ALL DOWN"));
    }

    #[test]
    fn market_only_fallback_uses_orderbook() {
        let book = Orderbook {
            yes: vec![PriceLevel::new(45, 100)],
            no: vec![PriceLevel::new(50, 10)],
        };
        let est = estimate_yes_probability(None, &book);
        assert_eq!(est.yes_probability, 53.0);
        assert!(est.market_only);
        assert_eq!(est.trend, None);
        assert!(est.narrative().contains("market-only"));
    }
}
