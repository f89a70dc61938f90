//! Prometheus-style metrics for decision cycles.
//!
//! This module provides metrics for:
//! - Decisions emitted, by action
//! - Risk vetoes and guardrail overrides
//! - Schema rejections of model responses
//! - Early exits
//! - Evaluation latency

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing::debug;

use crate::decision::Action;

// === Metric Name Constants ===

/// Evaluation latency metric name.
pub const METRIC_EVALUATION_LATENCY: &str = "decision_evaluation_latency_ms";
/// Decisions counter metric name.
pub const METRIC_DECISIONS: &str = "decisions_total";
/// Risk vetoes counter metric name.
pub const METRIC_RISK_VETOES: &str = "risk_vetoes_total";
/// Guardrail overrides counter metric name.
pub const METRIC_GUARD_OVERRIDES: &str = "guard_overrides_total";
/// Schema rejections counter metric name.
pub const METRIC_SCHEMA_REJECTIONS: &str = "schema_rejections_total";
/// Exits counter metric name.
pub const METRIC_EXITS: &str = "exits_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_EVALUATION_LATENCY,
        "Time to evaluate one decision cycle in milliseconds"
    );

    describe_counter!(METRIC_DECISIONS, "Total number of decisions emitted");
    describe_counter!(METRIC_RISK_VETOES, "Total number of cycles vetoed by the risk gate");
    describe_counter!(
        METRIC_GUARD_OVERRIDES,
        "Total number of guardrail corrections applied to model decisions"
    );
    describe_counter!(
        METRIC_SCHEMA_REJECTIONS,
        "Total number of model responses rejected by schema validation"
    );
    describe_counter!(METRIC_EXITS, "Total number of take-profit/stop-loss exits");

    debug!("Metrics initialized");
}

/// Count a decision.
pub fn inc_decisions(action: Action) {
    counter!(METRIC_DECISIONS, "action" => action.to_string()).increment(1);
}

/// Count a risk veto.
pub fn inc_risk_vetoes(reason: &'static str) {
    counter!(METRIC_RISK_VETOES, "reason" => reason).increment(1);
}

/// Count guardrail overrides.
pub fn inc_guard_overrides(count: usize) {
    counter!(METRIC_GUARD_OVERRIDES).increment(count as u64);
}

/// Count a schema rejection.
pub fn inc_schema_rejections() {
    counter!(METRIC_SCHEMA_REJECTIONS).increment(1);
}

/// Count an exit.
pub fn inc_exits(reason: &'static str) {
    counter!(METRIC_EXITS, "reason" => reason).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name).record(self.elapsed_ms());
    }
}

/// Create a latency timer for one evaluation.
pub fn timer_evaluation() -> LatencyTimer {
    LatencyTimer::new(METRIC_EVALUATION_LATENCY)
}
