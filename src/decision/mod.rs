//! Decision module: the fixed-shape output record.
//!
//! This module handles:
//! - The BUY/PASS decision type and its JSON shape
//! - Extracting a decision from model output
//! - Schema validation against revision bounds

pub mod parse;
pub mod schema;
pub mod types;

pub use parse::{extract_json, parse_response, UNPARSEABLE_REASONING};
pub use schema::validate;
pub use types::{clamp_edge, clamp_probability, Action, Decision};
