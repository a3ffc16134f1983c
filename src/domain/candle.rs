//! Candle (OHLCV bar) representation and timeframe resampling.

use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl Candle {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Collapse a daily candle series into weekly candles (ISO week buckets).
///
/// Each weekly candle carries the first open, max high, min low, last close,
/// summed volume, and the date of the last daily candle in the bucket. The
/// input must be ascending by date; the output preserves that order.
pub fn resample_weekly(candles: &[Candle]) -> Vec<Candle> {
    let mut weekly: Vec<Candle> = Vec::new();
    let mut current_week: Option<(i32, u32)> = None;

    for candle in candles {
        let iso = candle.date.iso_week();
        let week = (iso.year(), iso.week());

        match weekly.last_mut() {
            Some(bucket) if current_week == Some(week) => {
                bucket.high = bucket.high.max(candle.high);
                bucket.low = bucket.low.min(candle.low);
                bucket.close = candle.close;
                bucket.date = candle.date;
                bucket.volume += candle.volume;
            }
            _ => {
                current_week = Some(week);
                weekly.push(candle.clone());
            }
        }
    }

    weekly
}
