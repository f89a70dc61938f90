//! The fixed-shape decision record.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::market::Side;

/// What to do this cycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    /// Buy contracts on one side.
    #[strum(to_string = "BUY", serialize = "buy")]
    Buy,
    /// Do nothing this cycle.
    #[strum(to_string = "PASS", serialize = "pass")]
    #[default]
    Pass,
}

/// One cycle's decision.
///
/// Every key is always serialized (nulls included) so downstream consumers
/// see the same shape on BUY and PASS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// BUY or PASS.
    pub action: Action,
    /// Side to buy; null on PASS.
    #[serde(default)]
    pub side: Option<Side>,
    /// Contracts to buy; null on PASS.
    #[serde(default)]
    pub shares: Option<u32>,
    /// Limit price per contract in cents; null on PASS.
    #[serde(default)]
    pub max_price_cents: Option<u32>,
    /// Estimated win probability of the relevant side, 1..=99.
    #[serde(default)]
    pub estimated_probability: Option<u32>,
    /// Estimated probability minus implied probability, -50..=50.
    #[serde(default)]
    pub estimated_edge: Option<i32>,
    /// Free-text rationale.
    #[serde(default)]
    pub reasoning: String,
}

impl Decision {
    /// Create a PASS that still reports the estimate.
    pub fn pass(
        estimated_probability: u32,
        estimated_edge: i32,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            action: Action::Pass,
            side: None,
            shares: None,
            max_price_cents: None,
            estimated_probability: Some(clamp_probability(estimated_probability)),
            estimated_edge: Some(clamp_edge(estimated_edge)),
            reasoning: reasoning.into(),
        }
    }

    /// Create a BUY.
    pub fn buy(
        side: Side,
        shares: u32,
        max_price_cents: u32,
        estimated_probability: u32,
        estimated_edge: i32,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            action: Action::Buy,
            side: Some(side),
            shares: Some(shares),
            max_price_cents: Some(max_price_cents),
            estimated_probability: Some(clamp_probability(estimated_probability)),
            estimated_edge: Some(clamp_edge(estimated_edge)),
            reasoning: reasoning.into(),
        }
    }

    /// Check if this is a BUY.
    pub fn is_buy(&self) -> bool {
        self.action == Action::Buy
    }

    /// Turn this decision into a PASS, keeping the estimates.
    pub fn into_pass(self, reasoning: impl Into<String>) -> Self {
        Self {
            action: Action::Pass,
            side: None,
            shares: None,
            max_price_cents: None,
            reasoning: reasoning.into(),
            ..self
        }
    }

    /// Worst-case cost of the order in cents.
    pub fn max_cost_cents(&self) -> u64 {
        match (self.action, self.shares, self.max_price_cents) {
            (Action::Buy, Some(shares), Some(price)) => shares as u64 * price as u64,
            _ => 0,
        }
    }
}

/// Clamp to the 1..=99 probability range carried on the wire.
pub fn clamp_probability(points: u32) -> u32 {
    points.clamp(1, 99)
}

/// Clamp to the -50..=50 edge range carried on the wire.
pub fn clamp_edge(points: i32) -> i32 {
    points.clamp(-50, 50)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pass_serializes_every_key() {
        let d = Decision::pass(55, 3, "edge too thin");
        let value = serde_json::to_value(&d).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "action": "PASS",
                "side": null,
                "shares": null,
                "max_price_cents": null,
                "estimated_probability": 55,
                "estimated_edge": 3,
                "reasoning": "edge too thin"
            })
        );
    }

    #[test]
    fn buy_serializes_side_lowercase() {
        let d = Decision::buy(Side::No, 2, 45, 62, 14, "down trend");
        let value = serde_json::to_value(&d).unwrap();
        assert_eq!(value["action"], "BUY");
        assert_eq!(value["side"], "no");
        assert_eq!(d.max_cost_cents(), 90);
    }

    #[test]
    fn estimates_are_clamped_to_wire_ranges() {
        let d = Decision::pass(0, -80, "");
        assert_eq!(d.estimated_probability, Some(1));
        assert_eq!(d.estimated_edge, Some(-50));
    }

    #[test]
    fn into_pass_keeps_estimates() {
        let d = Decision::buy(Side::Yes, 1, 40, 52, 12, "x").into_pass("vetoed");
        assert_eq!(d.action, Action::Pass);
        assert_eq!(d.side, None);
        assert_eq!(d.shares, None);
        assert_eq!(d.estimated_probability, Some(52));
        assert_eq!(d.estimated_edge, Some(12));
        assert_eq!(d.reasoning, "vetoed");
        assert_eq!(d.max_cost_cents(), 0);
    }
}
