//! Unified error types for the decision engine.

use thiserror::Error;

use crate::market::Side;

/// Unified error type for the decision engine.
#[derive(Error, Debug)]
pub enum BotError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Market snapshot error.
    #[error("market error: {0}")]
    Market(#[from] MarketError),

    /// Decision schema error.
    #[error("decision error: {0}")]
    Decision(#[from] DecisionError),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Market snapshot validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    /// A quoted price is outside the tradable 1..=99 cent range.
    #[error("{field} price {value}¢ outside 1..=99")]
    PriceOutOfRange {
        /// Which quote field.
        field: &'static str,
        /// Offending value.
        value: u32,
    },

    /// Bid above ask on one side of the market.
    #[error("crossed {side} quote: bid={bid}¢ > ask={ask}¢")]
    CrossedQuote {
        /// Which side is crossed.
        side: Side,
        /// Best bid.
        bid: u32,
        /// Best ask.
        ask: u32,
    },

    /// Snapshot has no ticker.
    #[error("market ticker is empty")]
    MissingTicker,
}

/// Errors raised while validating a structured decision.
#[derive(Error, Debug)]
pub enum DecisionError {
    /// A field required for this action or revision is null or absent.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A field that must be null for this action carries a value.
    #[error("field `{0}` must be null on PASS")]
    UnexpectedField(&'static str),

    /// A numeric field is outside its allowed range.
    #[error("`{field}` = {value} outside {min}..={max}")]
    OutOfRange {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: i64,
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },

    /// The response contained a JSON object that does not match the schema.
    #[error("malformed decision json: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, BotError>;
