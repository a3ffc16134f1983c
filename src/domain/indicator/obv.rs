//! On-balance volume: cumulative volume signed by the close-to-close
//! direction. Valid from the first candle (starts at zero).

use crate::domain::candle::Candle;

pub fn calculate_obv(candles: &[Candle]) -> Vec<f64> {
    let mut values = Vec::with_capacity(candles.len());
    let mut running = 0.0;

    for (i, candle) in candles.iter().enumerate() {
        if i > 0 {
            let prev_close = candles[i - 1].close;
            if candle.close > prev_close {
                running += candle.volume as f64;
            } else if candle.close < prev_close {
                running -= candle.volume as f64;
            }
        }
        values.push(running);
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_candle(i: usize, close: f64, volume: i64) -> Candle {
        Candle {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    #[test]
    fn obv_accumulates_with_direction() {
        let candles = vec![
            make_candle(0, 100.0, 500),
            make_candle(1, 101.0, 1_000),
            make_candle(2, 100.5, 2_000),
            make_candle(3, 100.5, 3_000),
            make_candle(4, 102.0, 400),
        ];
        let obv = calculate_obv(&candles);
        assert_eq!(obv, vec![0.0, 1_000.0, -1_000.0, -1_000.0, -600.0]);
    }

    #[test]
    fn obv_empty() {
        assert!(calculate_obv(&[]).is_empty());
    }
}
