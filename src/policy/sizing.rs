//! Kelly position sizing.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Shares per unit of Kelly fraction before capping.
pub const SHARES_PER_KELLY_UNIT: u32 = 5;

/// Full Kelly fraction for a binary contract bought at `price_cents`.
///
/// With payout ratio `b = (100 - price) / price`, `f = (p*b - q) / b`.
/// Returns zero when the bet has no positive expectation or the inputs are
/// degenerate.
pub fn kelly_fraction(win_probability: Decimal, price_cents: u32) -> Decimal {
    if win_probability <= Decimal::ZERO
        || win_probability >= Decimal::ONE
        || price_cents == 0
        || price_cents >= 100
    {
        return Decimal::ZERO;
    }

    let price = Decimal::from(price_cents);
    let b = (Decimal::ONE_HUNDRED - price) / price;
    let q = Decimal::ONE - win_probability;
    let f = (win_probability * b - q) / b;

    f.max(Decimal::ZERO)
}

/// Shares for a trade that already cleared the edge threshold.
///
/// `ceil(kelly * multiplier * 5)` clamped to `1..=cap`; a cap of zero means no
/// trade.
pub fn kelly_shares(
    win_probability: Decimal,
    price_cents: u32,
    multiplier: Decimal,
    cap: u32,
) -> u32 {
    if cap == 0 {
        return 0;
    }

    let scaled =
        kelly_fraction(win_probability, price_cents) * multiplier * Decimal::from(SHARES_PER_KELLY_UNIT);
    let shares = scaled.ceil().to_u32().unwrap_or(cap);

    shares.clamp(1, cap)
}
