//! Spot-price signal types.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::market::Side;

/// One OHLCV candle from the spot feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time, unix milliseconds.
    #[serde(default)]
    pub open_time: i64,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Close price.
    pub close: f64,
    /// Base-asset volume.
    #[serde(default)]
    pub volume: f64,
    /// Close time, unix milliseconds.
    #[serde(default)]
    pub close_time: i64,
}

/// Raw spot data supplied with a cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceFeed {
    /// Latest spot price.
    pub spot: f64,
    /// Last ~15 one-minute candles, oldest first.
    #[serde(default)]
    pub candles_1m: Vec<Candle>,
    /// Last ~12 five-minute candles, oldest first.
    #[serde(default)]
    pub candles_5m: Vec<Candle>,
}

/// 15-minute momentum classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "UPPERCASE")]
pub enum Momentum {
    /// Price rose beyond the momentum threshold.
    #[strum(to_string = "UP")]
    Up,
    /// Price fell beyond the momentum threshold.
    #[strum(to_string = "DOWN")]
    Down,
    /// Inside the threshold band.
    #[strum(to_string = "FLAT")]
    Flat,
}

/// Agreement of the 5m, 15m and 1h moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum TrendAlignment {
    /// All three timeframes up.
    #[strum(to_string = "ALL UP")]
    AllUp,
    /// All three timeframes down.
    #[strum(to_string = "ALL DOWN")]
    AllDown,
    /// All three timeframes flat.
    #[strum(to_string = "ALL FLAT")]
    AllFlat,
    /// Timeframes disagree.
    #[strum(to_string = "MIXED")]
    Mixed,
}

impl TrendAlignment {
    /// Whether every timeframe points the way a side needs to win.
    pub fn is_unanimous_for(&self, side: Side) -> bool {
        matches!(
            (self, side),
            (TrendAlignment::AllUp, Side::Yes) | (TrendAlignment::AllDown, Side::No)
        )
    }
}

/// Technical indicators derived from a [`PriceFeed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceIndicators {
    /// Spot price.
    pub spot_price: f64,
    /// Percent change since the open of the latest 5m candle.
    pub pct_change_5m: f64,
    /// Percent change since the open of the first 1m candle.
    pub pct_change_15m: f64,
    /// Percent change since the open of the first 5m candle.
    pub pct_change_1h: f64,
    /// Momentum classification of the 15m change.
    pub momentum: Momentum,
    /// Trend agreement across 5m/15m/1h.
    pub trend: TrendAlignment,
    /// Simple moving average of 1m closes.
    pub sma_15m: f64,
    /// EMA(9) of 1m closes.
    pub ema_9: f64,
    /// RSI(9) of 1m closes.
    pub rsi_9: f64,
    /// Standard deviation of 1m percent returns.
    pub volatility_1m: f64,
    /// Most recent three 1m candles, oldest first.
    pub last_3_candles: Vec<Candle>,
}

impl PriceIndicators {
    /// Percent distance of spot above (+) or below (-) a reference level.
    pub fn pct_from(&self, reference: f64) -> f64 {
        if reference > 0.0 {
            (self.spot_price - reference) / reference * 100.0
        } else {
            0.0
        }
    }

    /// Percent distance of spot from EMA(9).
    pub fn ema_gap_pct(&self) -> f64 {
        self.pct_from(self.ema_9)
    }

    /// Percent distance of spot from the 15m SMA.
    pub fn sma_gap_pct(&self) -> f64 {
        self.pct_from(self.sma_15m)
    }
}
