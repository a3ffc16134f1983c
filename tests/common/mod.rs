#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;

use tidemark::domain::candle::Candle;
use tidemark::domain::error::TidemarkError;
use tidemark::domain::simulator::{BacktestParams, StrategyKind};
use tidemark::ports::data_port::MarketDataPort;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_candle(date: NaiveDate, open: f64, close: f64) -> Candle {
    Candle {
        date,
        open,
        high: open.max(close) + 0.5,
        low: open.min(close) - 0.5,
        close,
        volume: 10_000,
    }
}

/// Consecutive daily candles with a constant close-to-close step.
pub fn trending_candles(start: NaiveDate, count: usize, base: f64, step: f64) -> Vec<Candle> {
    let mut price = base;
    (0..count)
        .map(|i| {
            let open = price;
            price += step;
            make_candle(start + chrono::Duration::days(i as i64), open, price)
        })
        .collect()
}

pub fn default_params() -> BacktestParams {
    BacktestParams {
        symbol: "TEST".into(),
        start_date: date(2024, 1, 1),
        end_date: date(2024, 12, 31),
        initial_capital: 100_000.0,
        strategy: StrategyKind::FollowSignal,
        signal_threshold: 30.0,
        risk_per_trade: 0.02,
        transaction_cost_pct: 0.001,
        min_confluence_score: 40.0,
        min_confidence: 0.3,
        stop_loss_pct: 5.0,
        trailing_stop_pct: 10.0,
        rebalance_every: 5,
    }
}

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Candle>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(symbol.to_string(), candles);
        self
    }
}

impl MarketDataPort for MockDataPort {
    fn get_history(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Candle>, TidemarkError> {
        match self.data.get(symbol) {
            Some(candles) => Ok(candles
                .iter()
                .filter(|c| c.date >= start_date && c.date <= end_date)
                .cloned()
                .collect()),
            None => Err(TidemarkError::NoData {
                symbol: symbol.to_string(),
            }),
        }
    }

    fn get_price(&self, symbol: &str) -> Result<f64, TidemarkError> {
        self.data
            .get(symbol)
            .and_then(|candles| candles.last())
            .map(|c| c.close)
            .ok_or_else(|| TidemarkError::NoData {
                symbol: symbol.to_string(),
            })
    }

    fn list_symbols(&self) -> Result<Vec<String>, TidemarkError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}
