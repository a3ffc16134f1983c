//! Simple moving average.

use crate::domain::candle::Candle;

/// Rolling mean of closes. `None` until `period` candles have accumulated.
pub fn calculate_sma(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; candles.len()];
    if period == 0 || candles.len() < period {
        return values;
    }

    let mut window_sum: f64 = candles[..period].iter().map(|c| c.close).sum();
    values[period - 1] = Some(window_sum / period as f64);

    for i in period..candles.len() {
        window_sum += candles[i].close - candles[i - period].close;
        values[i] = Some(window_sum / period as f64);
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_candles(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1_000,
            })
            .collect()
    }

    #[test]
    fn sma_warmup_then_valid() {
        let candles = make_candles(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let sma = calculate_sma(&candles, 3);

        assert!(sma[0].is_none());
        assert!(sma[1].is_none());
        assert!((sma[2].unwrap() - 2.0).abs() < 1e-9);
        assert!((sma[3].unwrap() - 3.0).abs() < 1e-9);
        assert!((sma[4].unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn sma_insufficient_candles() {
        let candles = make_candles(&[1.0, 2.0]);
        let sma = calculate_sma(&candles, 5);
        assert!(sma.iter().all(Option::is_none));
    }

    #[test]
    fn sma_zero_period() {
        let candles = make_candles(&[1.0, 2.0, 3.0]);
        let sma = calculate_sma(&candles, 0);
        assert!(sma.iter().all(Option::is_none));
    }
}
