//! Technical indicators over spot candles.

use tracing::{debug, warn};

use super::types::{Candle, Momentum, PriceFeed, PriceIndicators, TrendAlignment};

/// Lookback for RSI and EMA.
pub const INDICATOR_PERIOD: usize = 9;

/// 15m change (percent) beyond which momentum is UP or DOWN.
pub const MOMENTUM_THRESHOLD_PCT: f64 = 0.15;

/// Per-timeframe change (percent) beyond which a trend counts as up or down.
pub const TREND_THRESHOLD_PCT: f64 = 0.05;

/// RSI over the last `period` close-to-close changes.
///
/// Returns a neutral 50 when fewer than `period + 1` candles are available,
/// and 100 when there were no losses in the window.
pub fn rsi(candles: &[Candle], period: usize) -> f64 {
    if period == 0 || candles.len() < period + 1 {
        return 50.0;
    }

    let window = &candles[candles.len() - (period + 1)..];
    let (gains, losses) = window.windows(2).fold((0.0, 0.0), |(g, l), w| {
        let change = w[1].close - w[0].close;
        if change > 0.0 {
            (g + change, l)
        } else {
            (g, l - change)
        }
    });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// EMA of closes, seeded with the SMA of the first `period` candles.
///
/// With `period` or fewer candles this is the plain mean of the closes.
pub fn ema(candles: &[Candle], period: usize) -> f64 {
    if candles.is_empty() {
        return 0.0;
    }
    if period == 0 || candles.len() <= period {
        return sma(candles);
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let seed = sma(&candles[..period]);

    candles[period..]
        .iter()
        .fold(seed, |ema, c| (c.close - ema) * multiplier + ema)
}

/// Mean close.
pub fn sma(candles: &[Candle]) -> f64 {
    if candles.is_empty() {
        return 0.0;
    }
    candles.iter().map(|c| c.close).sum::<f64>() / candles.len() as f64
}

/// Population standard deviation of close-to-close percent returns.
pub fn realized_volatility(candles: &[Candle]) -> f64 {
    let returns: Vec<f64> = candles
        .windows(2)
        .filter(|w| w[0].close > 0.0)
        .map(|w| (w[1].close - w[0].close) / w[0].close * 100.0)
        .collect();

    if returns.len() < 2 {
        return 0.0;
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    variance.sqrt()
}

/// Classify whether the 5m, 15m and 1h moves agree.
pub fn trend_alignment(pct_5m: f64, pct_15m: f64, pct_1h: f64) -> TrendAlignment {
    let moves = [pct_5m, pct_15m, pct_1h];

    if moves.iter().all(|m| *m > TREND_THRESHOLD_PCT) {
        TrendAlignment::AllUp
    } else if moves.iter().all(|m| *m < -TREND_THRESHOLD_PCT) {
        TrendAlignment::AllDown
    } else if moves.iter().all(|m| m.abs() <= TREND_THRESHOLD_PCT) {
        TrendAlignment::AllFlat
    } else {
        TrendAlignment::Mixed
    }
}

/// Classify the 15m change.
pub fn momentum(pct_change_15m: f64) -> Momentum {
    if pct_change_15m > MOMENTUM_THRESHOLD_PCT {
        Momentum::Up
    } else if pct_change_15m < -MOMENTUM_THRESHOLD_PCT {
        Momentum::Down
    } else {
        Momentum::Flat
    }
}

fn pct_change(from: f64, to: f64) -> f64 {
    if from > 0.0 {
        (to - from) / from * 100.0
    } else {
        0.0
    }
}

/// Derive indicators from a spot feed.
///
/// Returns `None` (price data *Unavailable*) when the spot price is not
/// positive or there are no 1m candles; the policy then falls back to
/// market-only analysis.
pub fn compute(feed: &PriceFeed) -> Option<PriceIndicators> {
    if !(feed.spot.is_finite() && feed.spot > 0.0) {
        warn!(spot = feed.spot, "Spot price unusable, treating price data as unavailable");
        return None;
    }
    if feed.candles_1m.is_empty() {
        warn!("No 1m candles, treating price data as unavailable");
        return None;
    }

    let spot = feed.spot;
    let pct_change_15m = feed
        .candles_1m
        .first()
        .map(|c| pct_change(c.open, spot))
        .unwrap_or(0.0);
    let pct_change_1h = feed
        .candles_5m
        .first()
        .map(|c| pct_change(c.open, spot))
        .unwrap_or(0.0);
    let pct_change_5m = feed
        .candles_5m
        .last()
        .map(|c| pct_change(c.open, spot))
        .unwrap_or(0.0);

    let start = feed.candles_1m.len().saturating_sub(3);
    let last_3_candles = feed.candles_1m[start..].to_vec();

    let indicators = PriceIndicators {
        spot_price: spot,
        pct_change_5m,
        pct_change_15m,
        pct_change_1h,
        momentum: momentum(pct_change_15m),
        trend: trend_alignment(pct_change_5m, pct_change_15m, pct_change_1h),
        sma_15m: sma(&feed.candles_1m),
        ema_9: ema(&feed.candles_1m, INDICATOR_PERIOD),
        rsi_9: rsi(&feed.candles_1m, INDICATOR_PERIOD),
        volatility_1m: realized_volatility(&feed.candles_1m),
        last_3_candles,
    };

    debug!(
        spot = indicators.spot_price,
        pct_15m = indicators.pct_change_15m,
        rsi = indicators.rsi_9,
        trend = %indicators.trend,
        "Indicators computed"
    );

    Some(indicators)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, close: f64) -> Candle {
        Candle {
            open_time: 0,
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume: 1.0,
            close_time: 0,
        }
    }

    fn closes(values: &[f64]) -> Vec<Candle> {
        values.iter().map(|v| candle(*v, *v)).collect()
    }

    #[test]
    fn rsi_is_neutral_without_enough_data() {
        assert_eq!(rsi(&closes(&[1.0, 2.0, 3.0]), 9), 50.0);
    }

    #[test]
    fn rsi_extremes() {
        let rising: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        assert_eq!(rsi(&closes(&rising), 9), 100.0);

        let falling: Vec<f64> = (0..10).map(|i| 100.0 - i as f64).collect();
        assert!(rsi(&closes(&falling), 9).abs() < 1e-9);
    }

    #[test]
    fn rsi_balanced_moves_are_fifty() {
        let zigzag = [100.0, 101.0, 100.0, 101.0, 100.0, 101.0, 100.0, 101.0, 100.0, 101.0];
        // 5 gains, 4 losses of equal size over 9 changes
        let value = rsi(&closes(&zigzag), 9);
        assert!((value - 100.0 * 5.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_uses_only_the_last_window() {
        let mut values: Vec<f64> = (0..10).map(|i| 200.0 - i as f64).collect();
        values.extend((1..=10).map(|i| 191.0 + i as f64));
        assert_eq!(rsi(&closes(&values), 9), 100.0);
    }

    #[test]
    fn ema_short_series_is_mean() {
        assert!((ema(&closes(&[1.0, 2.0, 3.0]), 9) - 2.0).abs() < 1e-9);
        assert_eq!(ema(&[], 9), 0.0);
    }

    #[test]
    fn ema_tracks_recent_prices() {
        let mut values = vec![100.0; 9];
        values.push(110.0);
        // seed 100, one step with multiplier 0.2
        assert!((ema(&closes(&values), 9) - 102.0).abs() < 1e-9);
    }

    #[test]
    fn volatility_of_constant_series_is_zero() {
        assert_eq!(realized_volatility(&closes(&[100.0, 100.0, 100.0])), 0.0);
        assert_eq!(realized_volatility(&closes(&[100.0, 101.0])), 0.0);
        assert!(realized_volatility(&closes(&[100.0, 101.0, 100.0, 102.0])) > 0.0);
    }

    #[test]
    fn trend_alignment_classification() {
        assert_eq!(trend_alignment(0.1, 0.2, 0.3), TrendAlignment::AllUp);
        assert_eq!(trend_alignment(-0.1, -0.2, -0.3), TrendAlignment::AllDown);
        assert_eq!(trend_alignment(0.01, -0.02, 0.0), TrendAlignment::AllFlat);
        assert_eq!(trend_alignment(0.1, -0.2, 0.3), TrendAlignment::Mixed);
        assert_eq!(trend_alignment(0.1, 0.2, 0.05), TrendAlignment::Mixed);
    }

    #[test]
    fn momentum_thresholds() {
        assert_eq!(momentum(0.16), Momentum::Up);
        assert_eq!(momentum(0.15), Momentum::Flat);
        assert_eq!(momentum(-0.2), Momentum::Down);
    }

    #[test]
    fn compute_requires_candles_and_spot() {
        let empty = PriceFeed {
            spot: 100_000.0,
            candles_1m: vec![],
            candles_5m: vec![],
        };
        assert!(compute(&empty).is_none());

        let no_spot = PriceFeed {
            spot: 0.0,
            candles_1m: closes(&[1.0]),
            candles_5m: vec![],
        };
        assert!(compute(&no_spot).is_none());
    }

    #[test]
    fn compute_derives_changes_from_candle_opens() {
        let feed = PriceFeed {
            spot: 100_300.0,
            candles_1m: vec![
                candle(100_000.0, 100_050.0),
                candle(100_050.0, 100_100.0),
                candle(100_100.0, 100_200.0),
                candle(100_200.0, 100_300.0),
            ],
            candles_5m: vec![candle(99_800.0, 100_000.0), candle(100_100.0, 100_300.0)],
        };

        let ind = compute(&feed).unwrap();
        assert!((ind.pct_change_15m - 0.3).abs() < 1e-9);
        assert!((ind.pct_change_5m - (200.0 / 100_100.0 * 100.0)).abs() < 1e-9);
        assert!(ind.pct_change_1h > 0.5);
        assert_eq!(ind.momentum, Momentum::Up);
        assert_eq!(ind.trend, TrendAlignment::AllUp);
        assert_eq!(ind.last_3_candles.len(), 3);
        assert_eq!(ind.last_3_candles[2].close, 100_300.0);
    }
}
