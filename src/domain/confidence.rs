//! Confidence model.
//!
//! Blends aggregate statistics into a bounded trust score. High volatility
//! scales confidence down; it never feeds back into signal strength. Floors
//! tied to signal magnitude are applied after the bonuses so an unrelated
//! low-consensus read cannot drag a strong signal's confidence under them.

use crate::domain::aggregate::{SignalAggregate, TimeframeAlignment};

pub const STRENGTH_WEIGHT: f64 = 0.3;
pub const CONSENSUS_WEIGHT: f64 = 0.4;
pub const ALIGNMENT_WEIGHT: f64 = 0.2;
pub const ALIGNMENT_BONUS: f64 = 0.1;
pub const PATTERN_BONUS: f64 = 0.1;
pub const MIN_CONFIDENCE: f64 = 0.05;
pub const MAX_CONFIDENCE: f64 = 0.95;

pub fn calculate_confidence(
    aggregate: &SignalAggregate,
    alignment: Option<&TimeframeAlignment>,
    volatility_pct: f64,
    key_pattern: bool,
) -> f64 {
    let strength_term = aggregate.signal_strength.abs() / 100.0 * STRENGTH_WEIGHT;
    let consensus_term = aggregate.consensus_ratio * CONSENSUS_WEIGHT;
    let aligned = alignment.is_some_and(|a| a.aligned);
    let alignment_term = if aligned { 1.0 } else { 0.5 } * ALIGNMENT_WEIGHT;

    let mut value =
        (strength_term + consensus_term + alignment_term) * volatility_factor(volatility_pct);

    if alignment.is_some_and(|a| a.strong) {
        value += ALIGNMENT_BONUS;
    }
    if key_pattern {
        value += PATTERN_BONUS;
    }

    value = value.max(strength_floor(aggregate.signal_strength));
    value.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

/// High volatility reduces confidence: 1.0 below 3%, 0.8 in 3-5%, 0.6 above.
pub fn volatility_factor(volatility_pct: f64) -> f64 {
    if volatility_pct < 3.0 {
        1.0
    } else if volatility_pct <= 5.0 {
        0.8
    } else {
        0.6
    }
}

/// Minimum confidence guaranteed for a given signal magnitude.
fn strength_floor(signal_strength: f64) -> f64 {
    let magnitude = signal_strength.abs();
    if magnitude > 70.0 {
        0.70
    } else if magnitude > 50.0 {
        0.50
    } else if magnitude > 30.0 {
        0.30
    } else {
        0.0
    }
}
