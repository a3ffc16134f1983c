//! Composite priority score.
//!
//! Five independent terms, one sum, one clamp to [0, 100]:
//! signal strength (30), confidence (25), the directional sub-score matching
//! the chosen action (20), a discrete risk tier from confidence bands (15),
//! and allocation drift scaled so a 20-point drift contributes the full 10.

use crate::domain::aggregate::SignalAggregate;
use crate::domain::recommendation::Action;

pub const SIGNAL_POINTS: f64 = 30.0;
pub const CONFIDENCE_POINTS: f64 = 25.0;
pub const DIRECTION_POINTS: f64 = 20.0;
pub const DRIFT_POINTS: f64 = 10.0;
pub const DRIFT_FULL_SCALE_PCT: f64 = 20.0;

pub const RISK_TIER_HIGH: f64 = 15.0;
pub const RISK_TIER_MID: f64 = 10.0;
pub const RISK_TIER_LOW: f64 = 5.0;
const HIGH_CONFIDENCE_BAND: f64 = 0.7;
const LOW_CONFIDENCE_BAND: f64 = 0.4;

pub fn composite_score(
    aggregate: &SignalAggregate,
    confidence: f64,
    action: Action,
    allocation_drift: f64,
) -> f64 {
    let signal_term = aggregate.signal_strength.abs() / 100.0 * SIGNAL_POINTS;
    let confidence_term = confidence * CONFIDENCE_POINTS;

    let sub_score = match action {
        Action::Buy => aggregate.buy_score,
        Action::Sell => aggregate.sell_score,
        Action::Hold => 0.0,
    };
    let direction_term = sub_score.min(100.0) / 100.0 * DIRECTION_POINTS;

    let risk_term = if confidence >= HIGH_CONFIDENCE_BAND {
        RISK_TIER_HIGH
    } else if confidence < LOW_CONFIDENCE_BAND {
        RISK_TIER_LOW
    } else {
        RISK_TIER_MID
    };

    let drift_term = (allocation_drift.abs() / DRIFT_FULL_SCALE_PCT).min(1.0) * DRIFT_POINTS;

    (signal_term + confidence_term + direction_term + risk_term + drift_term).clamp(0.0, 100.0)
}
