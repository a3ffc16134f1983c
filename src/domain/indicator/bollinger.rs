//! Bollinger bands: SMA middle band with bands at ±mult standard deviations
//! (population) of the window closes.

use crate::domain::candle::Candle;
use crate::domain::indicator::sma::calculate_sma;

#[derive(Debug, Clone)]
pub struct BollingerSeries {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

pub fn calculate_bollinger(candles: &[Candle], period: usize, mult: f64) -> BollingerSeries {
    let n = candles.len();
    let middle = calculate_sma(candles, period);
    let mut upper = vec![None; n];
    let mut lower = vec![None; n];

    for i in 0..n {
        let Some(mean) = middle[i] else { continue };
        let window = &candles[i + 1 - period..=i];
        let variance = window
            .iter()
            .map(|c| (c.close - mean).powi(2))
            .sum::<f64>()
            / period as f64;
        let band = mult * variance.sqrt();
        upper[i] = Some(mean + band);
        lower[i] = Some(mean - band);
    }

    BollingerSeries {
        upper,
        middle,
        lower,
    }
}
