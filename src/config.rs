//! Application configuration loaded from environment variables.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::policy::{PolicyLimits, PolicyRevision};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Policy ===
    /// Policy revision: "latest" (canonical) or "legacy".
    #[serde(default = "default_policy_revision")]
    pub policy_revision: String,

    /// Minimum edge in points before any BUY.
    #[serde(default = "default_min_edge")]
    pub min_edge_points: i32,

    /// Minimum edge in points while on a losing streak.
    #[serde(default = "default_streak_min_edge")]
    pub streak_min_edge_points: i32,

    /// Streak at or below which the losing-streak protocol applies (e.g. -3).
    #[serde(default = "default_losing_streak")]
    pub losing_streak_threshold: i32,

    /// Edge at which the policy pays the ask even on a wide spread.
    #[serde(default = "default_high_conviction_edge")]
    pub high_conviction_edge_points: i32,

    /// Spread (cents) above which entries are priced passively.
    #[serde(default = "default_wide_spread")]
    pub wide_spread_cents: u32,

    /// Operator cap on shares per trade, applied on top of the revision cap.
    #[serde(default = "default_max_shares")]
    pub max_shares: u32,

    /// Operator cap on price per share, applied on top of the revision ceiling.
    #[serde(default = "default_max_price")]
    pub max_price_cents: u32,

    /// Fraction of full Kelly used for sizing (0.5 = half Kelly).
    #[serde(default = "default_kelly_fraction")]
    pub kelly_fraction: Decimal,

    // === Risk Gate ===
    /// Minimum account balance required to trade.
    #[serde(default = "default_min_balance")]
    pub min_balance_cents: u64,

    /// Daily loss at which trading stops.
    #[serde(default = "default_max_daily_loss")]
    pub max_daily_loss_cents: i64,

    /// Consecutive losses at which trading stops.
    #[serde(default = "default_max_consecutive_losses")]
    pub max_consecutive_losses: u32,

    /// Minimum minutes left before expiry for a new entry.
    #[serde(default = "default_min_minutes_to_expiry")]
    pub min_minutes_to_expiry: f64,

    // === Exits ===
    /// Take profit once unrealized P&L per share reaches this many cents.
    #[serde(default = "default_take_profit")]
    pub take_profit_cents: u32,

    /// Stop out once unrealized loss per share reaches this many cents.
    #[serde(default = "default_stop_loss")]
    pub stop_loss_cents: u32,

    /// Number of recent trades shown in the prompt.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    // === Logging ===
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_policy_revision() -> String {
    "latest".to_string()
}

fn default_min_edge() -> i32 {
    8
}

fn default_streak_min_edge() -> i32 {
    12
}

fn default_losing_streak() -> i32 {
    -3
}

fn default_high_conviction_edge() -> i32 {
    20
}

fn default_wide_spread() -> u32 {
    10
}

fn default_max_shares() -> u32 {
    3
}

fn default_max_price() -> u32 {
    99
}

fn default_kelly_fraction() -> Decimal {
    Decimal::new(5, 1) // 0.5
}

fn default_min_balance() -> u64 {
    500 // $5
}

fn default_max_daily_loss() -> i64 {
    1000 // $10
}

fn default_max_consecutive_losses() -> u32 {
    7
}

fn default_min_minutes_to_expiry() -> f64 {
    2.0
}

fn default_take_profit() -> u32 {
    20
}

fn default_stop_loss() -> u32 {
    15
}

fn default_history_window() -> usize {
    20
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy_revision: default_policy_revision(),
            min_edge_points: default_min_edge(),
            streak_min_edge_points: default_streak_min_edge(),
            losing_streak_threshold: default_losing_streak(),
            high_conviction_edge_points: default_high_conviction_edge(),
            wide_spread_cents: default_wide_spread(),
            max_shares: default_max_shares(),
            max_price_cents: default_max_price(),
            kelly_fraction: default_kelly_fraction(),
            min_balance_cents: default_min_balance(),
            max_daily_loss_cents: default_max_daily_loss(),
            max_consecutive_losses: default_max_consecutive_losses(),
            min_minutes_to_expiry: default_min_minutes_to_expiry(),
            take_profit_cents: default_take_profit(),
            stop_loss_cents: default_stop_loss(),
            history_window: default_history_window(),
            rust_log: default_log_level(),
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if PolicyRevision::from_str(&self.policy_revision).is_err() {
            return Err(format!(
                "POLICY_REVISION must be `latest` or `legacy`, got `{}`",
                self.policy_revision
            ));
        }

        if self.min_edge_points <= 0 {
            return Err("MIN_EDGE_POINTS must be positive".to_string());
        }

        if self.streak_min_edge_points < self.min_edge_points {
            return Err("STREAK_MIN_EDGE_POINTS must be >= MIN_EDGE_POINTS".to_string());
        }

        if self.losing_streak_threshold >= 0 {
            return Err("LOSING_STREAK_THRESHOLD must be negative".to_string());
        }

        if self.max_shares == 0 {
            return Err("MAX_SHARES must be at least 1".to_string());
        }

        if !(1..=99).contains(&self.max_price_cents) {
            return Err("MAX_PRICE_CENTS must be within 1..=99".to_string());
        }

        if self.kelly_fraction <= Decimal::ZERO || self.kelly_fraction > Decimal::ONE {
            return Err("KELLY_FRACTION must be within (0, 1]".to_string());
        }

        if self.max_daily_loss_cents <= 0 {
            return Err("MAX_DAILY_LOSS_CENTS must be positive".to_string());
        }

        if self.take_profit_cents == 0 || self.stop_loss_cents == 0 {
            return Err("TAKE_PROFIT_CENTS and STOP_LOSS_CENTS must be positive".to_string());
        }

        Ok(())
    }

    /// Parsed policy revision; unknown strings fall back to the canonical one.
    pub fn revision(&self) -> PolicyRevision {
        PolicyRevision::from_str(&self.policy_revision).unwrap_or_default()
    }

    /// Effective limits: the revision's bounds narrowed by the operator caps.
    pub fn limits(&self) -> PolicyLimits {
        self.revision()
            .limits()
            .narrowed(self.max_shares, self.max_price_cents)
    }
}
