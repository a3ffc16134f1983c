//! Signal aggregation.
//!
//! Sums signed reading weights into a bounded directional strength. The
//! order is fixed: raw signed sum, then the quality multiplier, then the
//! clamp. Clamping first would under-reward strongly corroborated signals.

use crate::domain::indicator::Signal;
use crate::domain::normalizer::IndicatorSnapshot;

pub const CONSENSUS_THRESHOLD: f64 = 0.8;
pub const CONSENSUS_BONUS: f64 = 0.2;
pub const TIMEFRAME_STRENGTH_FLOOR: f64 = 30.0;
pub const TIMEFRAME_BONUS: f64 = 0.3;
pub const PATTERN_BONUS: f64 = 0.2;
pub const MAX_STRENGTH: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SignalAggregate {
    /// Bounded directional strength in [-100, 100].
    pub signal_strength: f64,
    /// Signed weight sum before the quality multiplier; used for
    /// cross-timeframe comparisons.
    pub raw_sum: f64,
    pub buy_score: f64,
    pub sell_score: f64,
    pub bullish_count: usize,
    pub bearish_count: usize,
    pub neutral_count: usize,
    pub consensus_ratio: f64,
    pub quality_multiplier: f64,
}

impl SignalAggregate {
    /// Aggregate with no readings; used for drift-only evaluations.
    pub fn empty() -> Self {
        SignalAggregate {
            signal_strength: 0.0,
            raw_sum: 0.0,
            buy_score: 0.0,
            sell_score: 0.0,
            bullish_count: 0,
            bearish_count: 0,
            neutral_count: 0,
            consensus_ratio: 0.0,
            quality_multiplier: 1.0,
        }
    }

    pub fn total_count(&self) -> usize {
        self.bullish_count + self.bearish_count + self.neutral_count
    }
}

/// Direction agreement between a primary aggregate and the same evaluation
/// over a higher timeframe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeframeAlignment {
    pub aligned: bool,
    /// Aligned with both raw strengths past the threshold.
    pub strong: bool,
}

impl TimeframeAlignment {
    pub fn between(primary: &SignalAggregate, secondary: &SignalAggregate) -> Self {
        let aligned = primary.raw_sum * secondary.raw_sum > 0.0;
        let strong = aligned
            && primary.raw_sum.abs() > TIMEFRAME_STRENGTH_FLOOR
            && secondary.raw_sum.abs() > TIMEFRAME_STRENGTH_FLOOR;
        TimeframeAlignment { aligned, strong }
    }
}

pub fn aggregate(
    snapshot: &IndicatorSnapshot,
    higher_timeframe: Option<&SignalAggregate>,
) -> SignalAggregate {
    let mut raw_sum = 0.0;
    let mut buy_score = 0.0;
    let mut sell_score = 0.0;
    let mut bullish_count = 0;
    let mut bearish_count = 0;
    let mut neutral_count = 0;

    for reading in &snapshot.readings {
        match reading.signal {
            Signal::Buy => {
                raw_sum += reading.weight;
                buy_score += reading.weight;
                bullish_count += 1;
            }
            Signal::Sell => {
                raw_sum -= reading.weight;
                sell_score += reading.weight;
                bearish_count += 1;
            }
            Signal::Neutral => neutral_count += 1,
        }
    }

    let total = snapshot.readings.len();
    let consensus_ratio = if total > 0 {
        bullish_count.max(bearish_count) as f64 / total as f64
    } else {
        0.0
    };

    let mut quality_multiplier = 1.0;
    if consensus_ratio > CONSENSUS_THRESHOLD {
        quality_multiplier += CONSENSUS_BONUS;
    }
    if let Some(higher) = higher_timeframe {
        if raw_sum * higher.raw_sum > 0.0
            && raw_sum.abs() > TIMEFRAME_STRENGTH_FLOOR
            && higher.raw_sum.abs() > TIMEFRAME_STRENGTH_FLOOR
        {
            quality_multiplier += TIMEFRAME_BONUS;
        }
    }
    if snapshot.key_pattern.is_some() {
        quality_multiplier += PATTERN_BONUS;
    }

    let signal_strength = (raw_sum * quality_multiplier).clamp(-MAX_STRENGTH, MAX_STRENGTH);

    SignalAggregate {
        signal_strength,
        raw_sum,
        buy_score,
        sell_score,
        bullish_count,
        bearish_count,
        neutral_count,
        consensus_ratio,
        quality_multiplier,
    }
}
