//! Trading module for open positions.
//!
//! This module handles:
//! - Open position tracking
//! - Take-profit / stop-loss exit signals

pub mod exit;

pub use exit::{check_exit, ExitReason, ExitSignal, OpenPosition};
