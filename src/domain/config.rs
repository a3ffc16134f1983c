//! Scoring configuration.
//!
//! One immutable value passed explicitly through the pipeline. Weight presets
//! are distinct `ScoringConfig` values, never runtime-mutated tables.

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub weight_rsi: f64,
    pub weight_macd_cross: f64,
    pub weight_macd_trend: f64,
    pub weight_ma_cross: f64,
    pub weight_price_vs_short_ma: f64,
    pub weight_price_vs_long_ma: f64,
    pub weight_bollinger: f64,
    pub weight_stochastic: f64,
    pub weight_volume_trend: f64,
    pub weight_reversal_pattern: f64,
    /// Aggregate strength at or above which a buy (or below the negation,
    /// a sell) is recommended.
    pub signal_threshold: f64,
    /// Allocation drift (percentage points) beyond which a drift-only
    /// evaluation recommends rebalancing.
    pub drift_band_pct: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            weight_rsi: 10.0,
            weight_macd_cross: 15.0,
            weight_macd_trend: 10.0,
            weight_ma_cross: 20.0,
            weight_price_vs_short_ma: 8.0,
            weight_price_vs_long_ma: 8.0,
            weight_bollinger: 8.0,
            weight_stochastic: 8.0,
            weight_volume_trend: 6.0,
            weight_reversal_pattern: 12.0,
            signal_threshold: 30.0,
            drift_band_pct: 5.0,
        }
    }
}
