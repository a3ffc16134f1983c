//! ATR (Average True Range) with Wilder smoothing.
//!
//! Seed is the simple mean of the first `period` true ranges; subsequent
//! values are (prev * (n-1) + tr) / n. The first bar's true range is its
//! high-low span (no previous close).

use crate::domain::candle::Candle;

pub fn calculate_atr(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let n = candles.len();
    let mut values = vec![None; n];
    if period == 0 || n < period {
        return values;
    }

    let mut tr = Vec::with_capacity(n);
    for (i, candle) in candles.iter().enumerate() {
        if i == 0 {
            tr.push(candle.high - candle.low);
        } else {
            tr.push(candle.true_range(candles[i - 1].close));
        }
    }

    let seed: f64 = tr[..period].iter().sum::<f64>() / period as f64;
    values[period - 1] = Some(seed);

    let mut prev = seed;
    for i in period..n {
        prev = (prev * (period as f64 - 1.0) + tr[i]) / period as f64;
        values[i] = Some(prev);
    }

    values
}
