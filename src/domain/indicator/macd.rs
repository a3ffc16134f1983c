//! MACD (Moving Average Convergence Divergence).
//!
//! Line = EMA(fast) - EMA(slow); signal = EMA(signal_period) of the line;
//! histogram = line - signal. The signal line is seeded from the first
//! `signal_period` valid line values, so it lags the line by that warmup.

use crate::domain::candle::Candle;
use crate::domain::indicator::ema::{calculate_ema, ema_series};

#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

pub fn calculate_macd(
    candles: &[Candle],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> MacdSeries {
    let n = candles.len();
    let fast_ema = calculate_ema(candles, fast);
    let slow_ema = calculate_ema(candles, slow);

    let mut line = vec![None; n];
    for i in 0..n {
        if let (Some(f), Some(s)) = (fast_ema[i], slow_ema[i]) {
            line[i] = Some(f - s);
        }
    }

    let mut signal = vec![None; n];
    if let Some(start) = line.iter().position(Option::is_some) {
        // Line values are contiguous from `start` because fast < slow.
        let valid: Vec<f64> = line[start..].iter().flatten().copied().collect();
        for (offset, value) in ema_series(&valid, signal_period).into_iter().enumerate() {
            signal[start + offset] = value;
        }
    }

    let mut histogram = vec![None; n];
    for i in 0..n {
        if let (Some(l), Some(s)) = (line[i], signal[i]) {
            histogram[i] = Some(l - s);
        }
    }

    MacdSeries {
        line,
        signal,
        histogram,
    }
}
