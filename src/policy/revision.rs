//! Policy revisions and the bounds each one imposes.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which revision of the trading policy is in force.
///
/// Only the limits differ; the decision rules are always the latest ones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PolicyRevision {
    /// 50¢ ceiling, up to 3 shares, estimates mandatory on every decision.
    #[default]
    Latest,
    /// 99¢ ceiling, up to 2 shares, estimates optional.
    Legacy,
}

impl PolicyRevision {
    /// Bounds for this revision.
    pub fn limits(&self) -> PolicyLimits {
        match self {
            PolicyRevision::Latest => PolicyLimits {
                max_shares: 3,
                max_price_cents: 50,
                require_estimates: true,
            },
            PolicyRevision::Legacy => PolicyLimits {
                max_shares: 2,
                max_price_cents: 99,
                require_estimates: false,
            },
        }
    }
}

/// Hard bounds on any decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PolicyLimits {
    /// Most contracts per BUY.
    pub max_shares: u32,
    /// Price ceiling per contract in cents.
    pub max_price_cents: u32,
    /// Whether probability and edge must be present on every decision.
    pub require_estimates: bool,
}

impl Default for PolicyLimits {
    fn default() -> Self {
        PolicyRevision::default().limits()
    }
}

impl PolicyLimits {
    /// Narrow by operator caps; caps never loosen a revision's bounds.
    pub fn narrowed(self, max_shares: u32, max_price_cents: u32) -> Self {
        Self {
            max_shares: self.max_shares.min(max_shares).max(1),
            max_price_cents: self.max_price_cents.min(max_price_cents).max(1),
            ..self
        }
    }
}
