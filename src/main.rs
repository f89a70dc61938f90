//! Kalshi BTC Up/Down decision policy entry point.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kalshi_updown::config::Config;
use kalshi_updown::engine::{review_response, run_cycle, CycleInput, CycleOutcome};
use kalshi_updown::metrics;
use kalshi_updown::prompt::{self, DEFAULT_PREAMBLE};
use kalshi_updown::replay::{replay, ReplayCycle};

/// Kalshi BTC Up/Down decision policy.
#[derive(Parser, Debug)]
#[command(name = "kalshi-updown")]
#[command(about = "Deterministic BUY/PASS decisions for Kalshi BTC Up/Down contracts")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate one cycle and print the decision.
    Evaluate {
        /// Cycle input JSON.
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Validate and guard a model response for a cycle.
    Review {
        /// Cycle input JSON.
        #[arg(short, long)]
        input: PathBuf,

        /// File holding the raw model response.
        #[arg(short, long)]
        response: PathBuf,
    },

    /// Render the model prompt for a cycle.
    Prompt {
        /// Cycle input JSON.
        #[arg(short, long)]
        input: PathBuf,

        /// Policy preamble (markdown); a built-in one is used when omitted.
        #[arg(long)]
        preamble: Option<PathBuf>,
    },

    /// Replay recorded cycles with known settlements.
    Replay {
        /// JSON array of cycles.
        #[arg(short, long)]
        input: PathBuf,

        /// Print a Prometheus metrics snapshot after the summary.
        #[arg(long)]
        metrics: bool,
    },

    /// Check configuration validity.
    CheckConfig,
}

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("kalshi_updown=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if args.json_logs {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }

    // Handle subcommands
    match args.command {
        Command::Evaluate { input } => cmd_evaluate(&input),
        Command::Review { input, response } => cmd_review(&input, &response),
        Command::Prompt { input, preamble } => cmd_prompt(&input, preamble.as_deref()),
        Command::Replay { input, metrics } => cmd_replay(&input, metrics),
        Command::CheckConfig => cmd_check_config(),
    }
}

/// Load and validate configuration.
fn load_config() -> anyhow::Result<Config> {
    let config = Config::load().context("Configuration load failed")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;
    Ok(config)
}

fn read_cycle(path: &Path) -> anyhow::Result<CycleInput> {
    let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    CycleInput::from_json(&json).with_context(|| format!("parsing {}", path.display()))
}

/// Evaluate one cycle.
fn cmd_evaluate(input: &Path) -> anyhow::Result<()> {
    let config = load_config()?;
    metrics::init_metrics();
    let cycle = read_cycle(input)?;

    let report = run_cycle(&cycle, &config)?;
    let json = match &report.outcome {
        CycleOutcome::Entry { decision } => serde_json::to_string_pretty(decision)?,
        _ => serde_json::to_string_pretty(&report)?,
    };
    println!("{}", json);

    Ok(())
}

/// Review a model response.
fn cmd_review(input: &Path, response: &Path) -> anyhow::Result<()> {
    let config = load_config()?;
    metrics::init_metrics();
    let cycle = read_cycle(input)?;
    let raw = fs::read_to_string(response)
        .with_context(|| format!("reading {}", response.display()))?;

    let report = review_response(&cycle, &raw, &config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Print the model prompt.
fn cmd_prompt(input: &Path, preamble: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config()?;
    let cycle = read_cycle(input)?;

    let preamble = match preamble {
        Some(path) => fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
        None => DEFAULT_PREAMBLE.to_string(),
    };

    let ctx = cycle.context();
    println!("{}", prompt::render(&preamble, &ctx, &cycle.history, &config));

    Ok(())
}

/// Replay recorded cycles.
fn cmd_replay(input: &Path, dump_metrics: bool) -> anyhow::Result<()> {
    let config = load_config()?;

    let handle = if dump_metrics {
        Some(
            PrometheusBuilder::new()
                .install_recorder()
                .context("installing metrics recorder")?,
        )
    } else {
        None
    };
    metrics::init_metrics();

    let json = fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let cycles: Vec<ReplayCycle> =
        serde_json::from_str(&json).with_context(|| format!("parsing {}", input.display()))?;
    info!(cycles = cycles.len(), "Starting replay");

    let report = replay(&cycles, &config)?;

    for step in &report.steps {
        println!("{}", serde_json::to_string(step)?);
    }

    let summary = &report.summary;
    let perf = &summary.performance;
    println!("======================================================================");
    println!("REPLAY SUMMARY");
    println!("======================================================================");
    println!("  Cycles: {}", summary.cycles);
    println!(
        "  BUY: {} | PASS: {} | Exits: {} | Holds: {} | Stale: {}",
        summary.buys, summary.passes, summary.exits, summary.holds, summary.stale
    );
    println!(
        "  W/L: {}/{} | Win rate: {:.1}%",
        perf.wins,
        perf.losses,
        perf.win_rate * rust_decimal::Decimal::ONE_HUNDRED
    );
    println!("  Total P&L: ${}", perf.total_pnl_dollars());
    println!("  Max drawdown: {}¢ | Streak: {}", perf.max_drawdown_cents, perf.current_streak);
    if let Some(balance) = summary.final_balance_cents {
        println!("  Final balance: ${}", rust_decimal::Decimal::new(balance, 2));
    }
    println!("======================================================================");

    if let Some(handle) = handle {
        println!("{}", handle.render());
    }

    Ok(())
}

/// Check configuration.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("KALSHI UP/DOWN POLICY - CONFIGURATION CHECK");
    println!("======================================================================");

    // Load configuration
    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    // Validate configuration
    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    // Show configuration summary
    let limits = config.limits();
    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Policy Revision: {}", config.revision());
    println!(
        "  Limits: {} shares max, {}¢ ceiling, estimates {}",
        limits.max_shares,
        limits.max_price_cents,
        if limits.require_estimates { "required" } else { "optional" }
    );
    println!(
        "  Min Edge: {} pts ({} pts at streak <= {})",
        config.min_edge_points, config.streak_min_edge_points, config.losing_streak_threshold
    );
    println!(
        "  Wide Spread: > {}¢ (pay through at edge >= {})",
        config.wide_spread_cents, config.high_conviction_edge_points
    );
    println!("  Kelly Fraction: {}", config.kelly_fraction);
    println!(
        "  Risk Gate: balance >= {}¢, daily loss < {}¢, losses < {}, expiry >= {:.1}min",
        config.min_balance_cents,
        config.max_daily_loss_cents,
        config.max_consecutive_losses,
        config.min_minutes_to_expiry
    );
    println!(
        "  Exits: take profit +{}¢, stop loss -{}¢",
        config.take_profit_cents, config.stop_loss_cents
    );
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}
