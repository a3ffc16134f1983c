//! Indicator normalizer.
//!
//! Maps a candle window to one normalized reading per catalog entry, with
//! two suppression rules so the same underlying move is never scored twice:
//!
//! 1. A MACD line/signal cross on the latest bar replaces the MACD trend
//!    reading.
//! 2. A short/long moving-average cross on the latest bar replaces both
//!    price-vs-MA readings.
//!
//! Volatility (ATR as a percentage of price) is carried on the snapshot for
//! the confidence calculator; it is never a directional reading.

use crate::domain::candle::Candle;
use crate::domain::config::ScoringConfig;
use crate::domain::error::TidemarkError;
use crate::domain::indicator::atr::calculate_atr;
use crate::domain::indicator::bollinger::calculate_bollinger;
use crate::domain::indicator::macd::calculate_macd;
use crate::domain::indicator::obv::calculate_obv;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::stochastic::calculate_stochastic;
use crate::domain::indicator::{IndicatorKind, IndicatorReading, Signal};

/// Minimum candle count before any scoring is attempted.
pub const MIN_CANDLES: usize = 50;

pub const RSI_PERIOD: usize = 14;
pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const SHORT_MA_PERIOD: usize = 20;
pub const LONG_MA_PERIOD: usize = 50;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_MULT: f64 = 2.0;
pub const STOCH_K_PERIOD: usize = 14;
pub const STOCH_D_PERIOD: usize = 3;
pub const STOCH_OVERSOLD: f64 = 20.0;
pub const STOCH_OVERBOUGHT: f64 = 80.0;
pub const OBV_LOOKBACK: usize = 10;
pub const ATR_PERIOD: usize = 14;

/// Output of one normalizer run over a candle window.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub readings: Vec<IndicatorReading>,
    /// ATR as a percentage of the latest close; confidence input only.
    pub volatility_pct: f64,
    /// Direction of an engulfing reversal pattern on the latest two bars.
    pub key_pattern: Option<Signal>,
}

pub fn normalize(
    candles: &[Candle],
    config: &ScoringConfig,
) -> Result<IndicatorSnapshot, TidemarkError> {
    if candles.len() < MIN_CANDLES {
        return Err(TidemarkError::InsufficientData {
            bars: candles.len(),
            minimum: MIN_CANDLES,
        });
    }

    let last = candles.len() - 1;
    let close = candles[last].close;
    let mut readings = Vec::new();

    let rsi = calculate_rsi(candles, RSI_PERIOD);
    if let Some(value) = rsi[last] {
        let signal = if value <= RSI_OVERSOLD {
            Signal::Buy
        } else if value >= RSI_OVERBOUGHT {
            Signal::Sell
        } else {
            Signal::Neutral
        };
        readings.push(IndicatorReading {
            kind: IndicatorKind::RsiMomentum,
            raw_value: value,
            signal,
            weight: config.weight_rsi,
        });
    }

    let macd = calculate_macd(candles, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    if let (Some(line_prev), Some(sig_prev), Some(line), Some(sig)) = (
        macd.line[last - 1],
        macd.signal[last - 1],
        macd.line[last],
        macd.signal[last],
    ) {
        let histogram = line - sig;
        if line > sig && line_prev <= sig_prev {
            readings.push(IndicatorReading {
                kind: IndicatorKind::MacdCross,
                raw_value: histogram,
                signal: Signal::Buy,
                weight: config.weight_macd_cross,
            });
        } else if line < sig && line_prev >= sig_prev {
            readings.push(IndicatorReading {
                kind: IndicatorKind::MacdCross,
                raw_value: histogram,
                signal: Signal::Sell,
                weight: config.weight_macd_cross,
            });
        } else {
            let signal = if line > sig {
                Signal::Buy
            } else if line < sig {
                Signal::Sell
            } else {
                Signal::Neutral
            };
            readings.push(IndicatorReading {
                kind: IndicatorKind::MacdTrend,
                raw_value: histogram,
                signal,
                weight: config.weight_macd_trend,
            });
        }
    }

    let short_ma = calculate_sma(candles, SHORT_MA_PERIOD);
    let long_ma = calculate_sma(candles, LONG_MA_PERIOD);
    let mut ma_cross_fired = false;
    if let (Some(short_prev), Some(long_prev), Some(short), Some(long)) = (
        short_ma[last - 1],
        long_ma[last - 1],
        short_ma[last],
        long_ma[last],
    ) {
        if short > long && short_prev <= long_prev {
            ma_cross_fired = true;
            readings.push(IndicatorReading {
                kind: IndicatorKind::MaCross,
                raw_value: short - long,
                signal: Signal::Buy,
                weight: config.weight_ma_cross,
            });
        } else if short < long && short_prev >= long_prev {
            ma_cross_fired = true;
            readings.push(IndicatorReading {
                kind: IndicatorKind::MaCross,
                raw_value: short - long,
                signal: Signal::Sell,
                weight: config.weight_ma_cross,
            });
        }
    }
    if !ma_cross_fired {
        if let Some(short) = short_ma[last] {
            readings.push(IndicatorReading {
                kind: IndicatorKind::PriceVsShortMa,
                raw_value: close - short,
                signal: position_signal(close, short),
                weight: config.weight_price_vs_short_ma,
            });
        }
        if let Some(long) = long_ma[last] {
            readings.push(IndicatorReading {
                kind: IndicatorKind::PriceVsLongMa,
                raw_value: close - long,
                signal: position_signal(close, long),
                weight: config.weight_price_vs_long_ma,
            });
        }
    }

    let bands = calculate_bollinger(candles, BOLLINGER_PERIOD, BOLLINGER_MULT);
    if let (Some(upper), Some(lower)) = (bands.upper[last], bands.lower[last]) {
        let width = upper - lower;
        let pct_b = if width > 0.0 {
            (close - lower) / width
        } else {
            0.5
        };
        let signal = if close <= lower {
            Signal::Buy
        } else if close >= upper {
            Signal::Sell
        } else {
            Signal::Neutral
        };
        readings.push(IndicatorReading {
            kind: IndicatorKind::BollingerBand,
            raw_value: pct_b,
            signal,
            weight: config.weight_bollinger,
        });
    }

    let stoch = calculate_stochastic(candles, STOCH_K_PERIOD, STOCH_D_PERIOD);
    if let Some(k) = stoch.k[last] {
        let signal = if k <= STOCH_OVERSOLD {
            Signal::Buy
        } else if k >= STOCH_OVERBOUGHT {
            Signal::Sell
        } else {
            Signal::Neutral
        };
        readings.push(IndicatorReading {
            kind: IndicatorKind::StochasticOsc,
            raw_value: k,
            signal,
            weight: config.weight_stochastic,
        });
    }

    let obv = calculate_obv(candles);
    if last >= OBV_LOOKBACK {
        let delta = obv[last] - obv[last - OBV_LOOKBACK];
        let signal = if delta > 0.0 {
            Signal::Buy
        } else if delta < 0.0 {
            Signal::Sell
        } else {
            Signal::Neutral
        };
        readings.push(IndicatorReading {
            kind: IndicatorKind::VolumeTrend,
            raw_value: delta,
            signal,
            weight: config.weight_volume_trend,
        });
    }

    let key_pattern = detect_engulfing(&candles[last - 1], &candles[last]);
    readings.push(IndicatorReading {
        kind: IndicatorKind::ReversalPattern,
        raw_value: key_pattern.map_or(0.0, |s| s.sign()),
        signal: key_pattern.unwrap_or(Signal::Neutral),
        weight: config.weight_reversal_pattern,
    });

    let atr = calculate_atr(candles, ATR_PERIOD);
    let volatility_pct = match atr[last] {
        Some(value) if close > 0.0 => value / close * 100.0,
        _ => 0.0,
    };

    Ok(IndicatorSnapshot {
        readings,
        volatility_pct,
        key_pattern,
    })
}

fn position_signal(close: f64, average: f64) -> Signal {
    if close > average {
        Signal::Buy
    } else if close < average {
        Signal::Sell
    } else {
        Signal::Neutral
    }
}

/// Engulfing pattern over the last two candles: opposite-colored bodies with
/// the second body fully covering the first.
fn detect_engulfing(prev: &Candle, curr: &Candle) -> Option<Signal> {
    let prev_body = (prev.close - prev.open).abs();
    let curr_body = (curr.close - curr.open).abs();
    if prev_body == 0.0 || curr_body <= prev_body {
        return None;
    }

    if prev.is_bearish() && curr.is_bullish() && curr.close >= prev.open && curr.open <= prev.close
    {
        Some(Signal::Buy)
    } else if prev.is_bullish()
        && curr.is_bearish()
        && curr.open >= prev.close
        && curr.close <= prev.open
    {
        Some(Signal::Sell)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn candle(i: usize, open: f64, close: f64) -> Candle {
        Candle {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64),
            open,
            high: open.max(close) + 0.5,
            low: open.min(close) - 0.5,
            close,
            volume: 10_000,
        }
    }

    fn flat_then_trend(flat: usize, trend: usize, step: f64) -> Vec<Candle> {
        let mut candles = Vec::new();
        let mut price = 100.0;
        for i in 0..flat {
            // Small alternation keeps averages well-defined without trending.
            let close = if i % 2 == 0 { price + 0.2 } else { price - 0.2 };
            candles.push(candle(i, price, close));
            price = close;
        }
        for i in 0..trend {
            let close = price + step;
            candles.push(candle(flat + i, price, close));
            price = close;
        }
        candles
    }

    #[test]
    fn insufficient_history_is_an_error() {
        let candles = flat_then_trend(30, 0, 0.0);
        let result = normalize(&candles, &ScoringConfig::default());
        assert!(matches!(
            result,
            Err(TidemarkError::InsufficientData {
                bars: 30,
                minimum: 50
            })
        ));
    }

    #[test]
    fn snapshot_has_one_reading_per_active_catalog_entry() {
        let candles = flat_then_trend(60, 10, 0.5);
        let snapshot = normalize(&candles, &ScoringConfig::default()).unwrap();

        // Without cross events: RSI, MACD trend, two price-vs-MA readings,
        // Bollinger, stochastic, volume trend, reversal pattern.
        let kinds: Vec<IndicatorKind> = snapshot.readings.iter().map(|r| r.kind).collect();
        assert!(kinds.contains(&IndicatorKind::RsiMomentum));
        assert!(kinds.contains(&IndicatorKind::BollingerBand));
        assert!(kinds.contains(&IndicatorKind::StochasticOsc));
        assert!(kinds.contains(&IndicatorKind::VolumeTrend));
        assert!(kinds.contains(&IndicatorKind::ReversalPattern));
    }

    #[test]
    fn macd_cross_suppresses_trend_reading() {
        // Decline long enough to pull the MACD line below its signal, then a
        // sharp rally to force a fresh cross on the final bar.
        let mut candles = Vec::new();
        let mut price = 200.0;
        for i in 0..70 {
            let close = price - 1.0;
            candles.push(candle(i, price, close));
            price = close;
        }
        for i in 0..12 {
            let close = price + 6.0;
            candles.push(candle(70 + i, price, close));
            price = close;
        }

        // Find a window whose last bar carries the cross.
        let mut seen_cross = false;
        for end in 71..=candles.len() {
            let snapshot = normalize(&candles[..end], &ScoringConfig::default()).unwrap();
            let has_cross = snapshot
                .readings
                .iter()
                .any(|r| r.kind == IndicatorKind::MacdCross);
            let has_trend = snapshot
                .readings
                .iter()
                .any(|r| r.kind == IndicatorKind::MacdTrend);
            assert!(
                !(has_cross && has_trend),
                "cross and trend readings must be mutually exclusive"
            );
            seen_cross |= has_cross;
        }
        assert!(seen_cross, "expected a MACD cross somewhere in the rally");
    }

    #[test]
    fn ma_cross_suppresses_price_vs_ma_readings() {
        let mut candles = Vec::new();
        let mut price = 200.0;
        for i in 0..80 {
            let close = price - 0.5;
            candles.push(candle(i, price, close));
            price = close;
        }
        for i in 0..40 {
            let close = price + 2.0;
            candles.push(candle(80 + i, price, close));
            price = close;
        }

        let mut seen_cross = false;
        for end in 81..=candles.len() {
            let snapshot = normalize(&candles[..end], &ScoringConfig::default()).unwrap();
            let has_cross = snapshot
                .readings
                .iter()
                .any(|r| r.kind == IndicatorKind::MaCross);
            let has_position = snapshot.readings.iter().any(|r| {
                r.kind == IndicatorKind::PriceVsShortMa || r.kind == IndicatorKind::PriceVsLongMa
            });
            assert!(
                !(has_cross && has_position),
                "MA cross must suppress price-vs-MA readings"
            );
            seen_cross |= has_cross;
        }
        assert!(seen_cross, "expected a golden cross during the recovery");
    }

    #[test]
    fn volatility_carried_on_snapshot_only() {
        let candles = flat_then_trend(60, 10, 0.5);
        let snapshot = normalize(&candles, &ScoringConfig::default()).unwrap();
        // The candles have real ranges, so ATR is positive; it reaches the
        // pipeline through the snapshot field, not through a reading.
        assert!(snapshot.volatility_pct > 0.0);
        assert_eq!(snapshot.readings.len(), 8);
    }

    #[test]
    fn bullish_engulfing_detected() {
        let prev = candle(0, 100.0, 98.0);
        let curr = candle(1, 97.5, 101.0);
        assert_eq!(detect_engulfing(&prev, &curr), Some(Signal::Buy));
    }

    #[test]
    fn bearish_engulfing_detected() {
        let prev = candle(0, 100.0, 102.0);
        let curr = candle(1, 102.5, 99.0);
        assert_eq!(detect_engulfing(&prev, &curr), Some(Signal::Sell));
    }

    #[test]
    fn small_second_body_is_not_engulfing() {
        let prev = candle(0, 100.0, 96.0);
        let curr = candle(1, 96.5, 97.5);
        assert_eq!(detect_engulfing(&prev, &curr), None);
    }

    #[test]
    fn degenerate_prices_do_not_panic() {
        let mut candles = flat_then_trend(60, 0, 0.0);
        let last = candles.len() - 1;
        candles[last].close = 0.0;
        candles[last].open = 0.0;
        let snapshot = normalize(&candles, &ScoringConfig::default()).unwrap();
        assert!((snapshot.volatility_pct - 0.0).abs() < f64::EPSILON);
        assert!(snapshot.readings.iter().all(|r| r.raw_value.is_finite()));
    }
}
