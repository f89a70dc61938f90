//! Render a decision cycle into the sectioned prompt text sent to a model.

use std::fmt::Write as _;

use crate::config::Config;
use crate::market::{MarketSnapshot, Side};
use crate::orderbook::{Orderbook, PriceLevel};
use crate::performance::{PerformanceState, TradeRecord};
use crate::policy::DecisionContext;
use crate::signal::PriceIndicators;

/// Asset label used in the price section header.
pub const ASSET_LABEL: &str = "BTC";

/// Orderbook levels shown per side.
const BOOK_LEVELS: usize = 5;

/// Policy preamble used when no custom one is supplied.
pub const DEFAULT_PREAMBLE: &str = "\
You trade Kalshi BTC Up/Down binary contracts. Each cycle decide BUY or PASS.

Rules:
- Edge = your probability minus the ask of the side you buy.
- Edge < 8 -> PASS. 8-12 -> 1 share. 12-20 -> 1-2 shares. >= 20 -> up to 3 shares.
- Streak <= -3: minimum edge 12, max 1 share, trend must be unanimous with your side.
- Spread > 10c: bid one cent above the best bid unless edge >= 20.
- Never pay more than 50c per share.

Respond with one JSON object:
{\"action\": \"BUY\" | \"PASS\", \"side\": \"yes\" | \"no\" | null, \"shares\": int | null,
 \"max_price_cents\": int | null, \"estimated_probability\": int, \"estimated_edge\": int,
 \"reasoning\": string}";

/// Render the full prompt for one cycle.
///
/// `history` is oldest first; the last `config.history_window` rows are shown.
pub fn render(preamble: &str, ctx: &DecisionContext, history: &[TradeRecord], config: &Config) -> String {
    let start = history.len().saturating_sub(config.history_window);
    let recent = &history[start..];

    let mut out = String::with_capacity(2048);
    out.push_str(preamble.trim_end());

    section(&mut out, "STATS", &format_stats(&ctx.performance));
    section(
        &mut out,
        &format!("LAST {} TRADES", recent.len()),
        &format_ledger(recent),
    );
    section(&mut out, "MARKET", &format_market(&ctx.market));
    section(&mut out, "ORDERBOOK", &format_book(&ctx.market.orderbook));
    section(&mut out, "SIGNAL SUMMARY", &ctx.estimate().narrative());

    let price = match &ctx.signal {
        Some(ind) => format_price(ind),
        None => "Unavailable this cycle.".to_string(),
    };
    section(&mut out, &format!("{} PRICE", ASSET_LABEL), &price);

    out
}

fn section(out: &mut String, title: &str, body: &str) {
    let _ = write!(out, "\n\n---\n## {}\n{}", title, body);
}

fn format_stats(s: &PerformanceState) -> String {
    format!(
        "Trades: {} | W/L: {}/{} | Win rate: {:.1}% | P&L: {}¢ | Today: {}¢ | Streak: {} | Drawdown: {}¢",
        s.total_trades,
        s.wins,
        s.losses,
        s.win_rate * rust_decimal::Decimal::ONE_HUNDRED,
        s.total_pnl_cents,
        s.today_pnl_cents,
        s.current_streak,
        s.max_drawdown_cents
    )
}

fn format_ledger(trades: &[TradeRecord]) -> String {
    if trades.is_empty() {
        return "No trades yet.".to_string();
    }
    trades
        .iter()
        .map(|t| {
            format!(
                "{} | {} | {} | {}x @ {}¢ | {} | {}¢",
                t.timestamp, t.ticker, t.side, t.shares, t.price_cents, t.result, t.pnl_cents
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn cents(value: Option<u32>) -> String {
    value.map(|v| format!("{}¢", v)).unwrap_or_else(|| "-".to_string())
}

fn format_market(m: &MarketSnapshot) -> String {
    let expiry = m
        .minutes_to_expiry
        .map(|min| format!("{:.1}min", min))
        .unwrap_or_else(|| "unknown".to_string());

    format!(
        "Ticker: {} | Title: {} | Yes bid/ask: {}/{} | No bid/ask: {}/{} | Last: {} | Vol: {} | 24h Vol: {} | OI: {} | Expiry: {}",
        m.ticker,
        m.title.as_deref().unwrap_or("-"),
        cents(m.yes_bid),
        cents(m.yes_ask),
        cents(m.no_bid),
        cents(m.no_ask),
        cents(m.last_price),
        m.volume,
        m.volume_24h,
        m.open_interest,
        expiry
    )
}

fn format_book(book: &Orderbook) -> String {
    if book.is_empty() {
        return "No resting bids.".to_string();
    }
    format!(
        "Yes bids: {}\nNo bids: {}\nDepth: {} YES / {} NO",
        format_book_side(&book.sorted_levels(Side::Yes)),
        format_book_side(&book.sorted_levels(Side::No)),
        book.total_depth(Side::Yes),
        book.total_depth(Side::No),
    )
}

fn format_book_side(levels: &[PriceLevel]) -> String {
    if levels.is_empty() {
        return "empty".to_string();
    }
    levels
        .iter()
        .take(BOOK_LEVELS)
        .map(|l| format!("{}¢ x{}", l.price, l.quantity))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_price(ind: &PriceIndicators) -> String {
    let mut s = format!(
        "Spot: ${:.2} | 5m: {:+.3}% | 15m: {:+.3}% | 1h: {:+.3}% | Momentum: {} | Trend: {}\n\
         SMA(15x1m): ${:.2} ({:+.3}%) | EMA(9): ${:.2} ({:+.3}%) | RSI(9): {:.1} | 1m volatility: {:.4}%",
        ind.spot_price,
        ind.pct_change_5m,
        ind.pct_change_15m,
        ind.pct_change_1h,
        ind.momentum,
        ind.trend,
        ind.sma_15m,
        ind.sma_gap_pct(),
        ind.ema_9,
        ind.ema_gap_pct(),
        ind.rsi_9,
        ind.volatility_1m,
    );

    if !ind.last_3_candles.is_empty() {
        let candles = ind
            .last_3_candles
            .iter()
            .map(|c| {
                format!(
                    "O:{:.0} H:{:.0} L:{:.0} C:{:.0} V:{:.1}",
                    c.open, c.high, c.low, c.close, c.volume
                )
            })
            .collect::<Vec<_>>()
            .join(" | ");
        s.push_str("\nLast 3 candles (1m): ");
        s.push_str(&candles);
    }

    s
}
