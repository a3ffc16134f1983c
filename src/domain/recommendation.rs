//! Recommendation pipeline.
//!
//! normalize -> aggregate -> confidence -> composite, with the same candles
//! resampled to weekly bars for the higher-timeframe comparison. A window
//! shorter than the minimum degrades to an allocation-drift-only evaluation
//! instead of failing.

use std::fmt;

use crate::domain::aggregate::{aggregate, SignalAggregate, TimeframeAlignment};
use crate::domain::candle::{resample_weekly, Candle};
use crate::domain::composite::composite_score;
use crate::domain::confidence::{calculate_confidence, MIN_CONFIDENCE};
use crate::domain::config::ScoringConfig;
use crate::domain::normalizer::{normalize, MIN_CANDLES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Buy => "buy",
            Action::Sell => "sell",
            Action::Hold => "hold",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        };
        write!(f, "{}", name)
    }
}

const PRIORITY_HIGH_SCORE: f64 = 70.0;
const PRIORITY_MEDIUM_SCORE: f64 = 40.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub symbol: String,
    pub action: Action,
    pub priority: Priority,
    pub signal_strength: f64,
    pub confidence: f64,
    pub composite_score: f64,
    pub allocation_drift: f64,
    pub reason: String,
}

/// Evaluate one symbol over a candle window.
///
/// Pure: identical inputs produce an identical recommendation.
pub fn recommend(
    symbol: &str,
    candles: &[Candle],
    allocation_drift: f64,
    config: &ScoringConfig,
) -> Recommendation {
    let snapshot = match normalize(candles, config) {
        Ok(snapshot) => snapshot,
        Err(_) => return drift_only(symbol, candles.len(), allocation_drift, config),
    };

    let weekly = resample_weekly(candles);
    let higher = normalize(&weekly, config)
        .ok()
        .map(|weekly_snapshot| aggregate(&weekly_snapshot, None));

    let agg = aggregate(&snapshot, higher.as_ref());
    let alignment = higher
        .as_ref()
        .map(|higher_agg| TimeframeAlignment::between(&agg, higher_agg));
    let confidence = calculate_confidence(
        &agg,
        alignment.as_ref(),
        snapshot.volatility_pct,
        snapshot.key_pattern.is_some(),
    );

    let action = if agg.signal_strength >= config.signal_threshold {
        Action::Buy
    } else if agg.signal_strength <= -config.signal_threshold {
        Action::Sell
    } else {
        Action::Hold
    };

    let score = composite_score(&agg, confidence, action, allocation_drift);

    Recommendation {
        symbol: symbol.to_string(),
        action,
        priority: priority_for(score),
        signal_strength: agg.signal_strength,
        confidence,
        composite_score: score,
        allocation_drift,
        reason: build_reason(&agg, action, confidence),
    }
}

fn drift_only(
    symbol: &str,
    bars: usize,
    allocation_drift: f64,
    config: &ScoringConfig,
) -> Recommendation {
    let action = if allocation_drift <= -config.drift_band_pct {
        Action::Buy
    } else if allocation_drift >= config.drift_band_pct {
        Action::Sell
    } else {
        Action::Hold
    };

    let empty = SignalAggregate::empty();
    let score = composite_score(&empty, MIN_CONFIDENCE, action, allocation_drift);

    Recommendation {
        symbol: symbol.to_string(),
        action,
        priority: priority_for(score),
        signal_strength: 0.0,
        confidence: MIN_CONFIDENCE,
        composite_score: score,
        allocation_drift,
        reason: format!(
            "insufficient history ({} candles, need {}); allocation drift only",
            bars, MIN_CANDLES
        ),
    }
}

fn priority_for(score: f64) -> Priority {
    if score >= PRIORITY_HIGH_SCORE {
        Priority::High
    } else if score >= PRIORITY_MEDIUM_SCORE {
        Priority::Medium
    } else {
        Priority::Low
    }
}

fn build_reason(agg: &SignalAggregate, action: Action, confidence: f64) -> String {
    format!(
        "{}: {} of {} indicators bullish, {} bearish; strength {:.0}, confidence {:.2}",
        action,
        agg.bullish_count,
        agg.total_count(),
        agg.bearish_count,
        agg.signal_strength,
        confidence
    )
}
