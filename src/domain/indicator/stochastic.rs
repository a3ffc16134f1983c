//! Stochastic oscillator.
//!
//! %K = (close - lowest_low) / (highest_high - lowest_low) * 100 over the
//! lookback window; %D = SMA of %K. A flat window (zero range) reads 50.

use crate::domain::candle::Candle;

#[derive(Debug, Clone)]
pub struct StochasticSeries {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

pub fn calculate_stochastic(
    candles: &[Candle],
    k_period: usize,
    d_period: usize,
) -> StochasticSeries {
    let n = candles.len();
    let mut k = vec![None; n];
    let mut d = vec![None; n];
    if k_period == 0 || d_period == 0 || n < k_period {
        return StochasticSeries { k, d };
    }

    for i in k_period - 1..n {
        let window = &candles[i + 1 - k_period..=i];
        let highest = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        let lowest = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
        let range = highest - lowest;
        k[i] = Some(if range > 0.0 {
            (candles[i].close - lowest) / range * 100.0
        } else {
            50.0
        });
    }

    for i in k_period - 1 + d_period - 1..n {
        let sum: f64 = k[i + 1 - d_period..=i].iter().flatten().sum();
        d[i] = Some(sum / d_period as f64);
    }

    StochasticSeries { k, d }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_candle(i: usize, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64),
            open: close,
            high,
            low,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn k_at_window_top_is_100() {
        let candles: Vec<Candle> = (0..20)
            .map(|i| make_candle(i, 100.0 + i as f64, 90.0 + i as f64, 100.0 + i as f64))
            .collect();
        let stoch = calculate_stochastic(&candles, 14, 3);
        assert!((stoch.k[19].unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn k_at_window_bottom_is_0() {
        let candles: Vec<Candle> = (0..20)
            .map(|i| make_candle(i, 110.0 - i as f64, 100.0 - i as f64, 100.0 - i as f64))
            .collect();
        let stoch = calculate_stochastic(&candles, 14, 3);
        assert!(stoch.k[19].unwrap().abs() < 1e-9);
    }

    #[test]
    fn flat_window_reads_50() {
        let candles: Vec<Candle> = (0..20).map(|i| make_candle(i, 100.0, 100.0, 100.0)).collect();
        let stoch = calculate_stochastic(&candles, 14, 3);
        assert!((stoch.k[19].unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn d_is_mean_of_recent_k() {
        let candles: Vec<Candle> = (0..20)
            .map(|i| make_candle(i, 105.0 + i as f64, 95.0 + i as f64, 100.0 + i as f64))
            .collect();
        let stoch = calculate_stochastic(&candles, 14, 3);
        let expected =
            (stoch.k[17].unwrap() + stoch.k[18].unwrap() + stoch.k[19].unwrap()) / 3.0;
        assert!((stoch.d[19].unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn warmup_is_none() {
        let candles: Vec<Candle> = (0..20)
            .map(|i| make_candle(i, 105.0, 95.0, 100.0))
            .collect();
        let stoch = calculate_stochastic(&candles, 14, 3);
        assert!(stoch.k[12].is_none());
        assert!(stoch.k[13].is_some());
        assert!(stoch.d[14].is_none());
        assert!(stoch.d[15].is_some());
    }
}
