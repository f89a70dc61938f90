//! Strict schema validation of a decision against the revision's bounds.

use tracing::warn;

use super::types::{Action, Decision};
use crate::error::DecisionError;
use crate::metrics;
use crate::policy::PolicyLimits;

fn check_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<(), DecisionError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(DecisionError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// Validate a decision.
///
/// BUY needs side, shares and price within the limits; PASS must leave them
/// null. Estimates are range-checked whenever present and are mandatory when
/// the limits require them.
pub fn validate(decision: &Decision, limits: &PolicyLimits) -> Result<(), DecisionError> {
    let result = validate_inner(decision, limits);
    if let Err(ref e) = result {
        metrics::inc_schema_rejections();
        warn!(action = %decision.action, error = %e, "Decision rejected by schema");
    }
    result
}

fn validate_inner(decision: &Decision, limits: &PolicyLimits) -> Result<(), DecisionError> {
    match decision.action {
        Action::Buy => {
            if decision.side.is_none() {
                return Err(DecisionError::MissingField("side"));
            }
            let shares = decision.shares.ok_or(DecisionError::MissingField("shares"))?;
            check_range("shares", shares as i64, 1, limits.max_shares as i64)?;
            let price = decision
                .max_price_cents
                .ok_or(DecisionError::MissingField("max_price_cents"))?;
            check_range("max_price_cents", price as i64, 1, limits.max_price_cents as i64)?;
        }
        Action::Pass => {
            if decision.side.is_some() {
                return Err(DecisionError::UnexpectedField("side"));
            }
            if decision.shares.is_some() {
                return Err(DecisionError::UnexpectedField("shares"));
            }
            if decision.max_price_cents.is_some() {
                return Err(DecisionError::UnexpectedField("max_price_cents"));
            }
        }
    }

    match decision.estimated_probability {
        Some(p) => check_range("estimated_probability", p as i64, 1, 99)?,
        None if limits.require_estimates => {
            return Err(DecisionError::MissingField("estimated_probability"))
        }
        None => {}
    }

    match decision.estimated_edge {
        Some(e) => check_range("estimated_edge", e as i64, -50, 50)?,
        None if limits.require_estimates => {
            return Err(DecisionError::MissingField("estimated_edge"))
        }
        None => {}
    }

    Ok(())
}
