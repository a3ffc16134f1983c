//! CSV candle store.
//!
//! One `{symbol}.csv` file per symbol under a base directory, with a header
//! row and columns `date,open,high,low,close,volume` (date as YYYY-MM-DD).
//! Also writes equity curves back out as CSV for inspection.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::domain::candle::Candle;
use crate::domain::error::TidemarkError;
use crate::domain::metrics::EquityPoint;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;

pub struct CsvStoreAdapter {
    base_path: PathBuf,
}

impl CsvStoreAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Build from `[data] path` in the configuration.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TidemarkError> {
        let path = config
            .get_string("data", "path")
            .ok_or_else(|| TidemarkError::ConfigMissing {
                section: "data".into(),
                key: "path".into(),
            })?;
        Ok(Self::new(PathBuf::from(path)))
    }

    fn candle_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn store_error(reason: String) -> TidemarkError {
    TidemarkError::Store { reason }
}

fn parse_column<T: FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<T, TidemarkError> {
    let raw = record
        .get(index)
        .ok_or_else(|| store_error(format!("missing {} column", name)))?;
    raw.trim()
        .parse()
        .map_err(|_| store_error(format!("invalid {} value: {:?}", name, raw)))
}

fn parse_row(record: &csv::StringRecord, symbol: &str) -> Result<Candle, TidemarkError> {
    let date_str: String = parse_column(record, 0, "date")?;
    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
        .map_err(|e| store_error(format!("invalid date for {}: {}", symbol, e)))?;

    Ok(Candle {
        date,
        open: parse_column(record, 1, "open")?,
        high: parse_column(record, 2, "high")?,
        low: parse_column(record, 3, "low")?,
        close: parse_column(record, 4, "close")?,
        volume: parse_column(record, 5, "volume")?,
    })
}

impl MarketDataPort for CsvStoreAdapter {
    fn get_history(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Candle>, TidemarkError> {
        let path = self.candle_path(symbol);
        let mut reader = csv::Reader::from_path(&path)
            .map_err(|e| store_error(format!("failed to open {}: {}", path.display(), e)))?;

        let mut candles = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| store_error(format!("CSV parse error: {}", e)))?;
            let candle = parse_row(&record, symbol)?;
            if candle.date < start_date || candle.date > end_date {
                continue;
            }
            candles.push(candle);
        }

        candles.sort_by_key(|c| c.date);
        Ok(candles)
    }

    fn get_price(&self, symbol: &str) -> Result<f64, TidemarkError> {
        let candles = self.get_history(symbol, NaiveDate::MIN, NaiveDate::MAX)?;
        candles
            .last()
            .map(|c| c.close)
            .ok_or_else(|| TidemarkError::NoData {
                symbol: symbol.to_string(),
            })
    }

    fn list_symbols(&self) -> Result<Vec<String>, TidemarkError> {
        let entries = std::fs::read_dir(&self.base_path).map_err(|e| {
            store_error(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| store_error(format!("directory entry error: {}", e)))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(symbol) = name.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

/// Write an equity curve as `date,equity` CSV.
pub fn write_equity_curve(path: &Path, curve: &[EquityPoint]) -> Result<(), TidemarkError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| store_error(format!("failed to create {}: {}", path.display(), e)))?;

    writer
        .write_record(["date", "equity"])
        .map_err(|e| store_error(format!("CSV write error: {}", e)))?;
    for point in curve {
        writer
            .write_record([point.date.to_string(), format!("{:.2}", point.value)])
            .map_err(|e| store_error(format!("CSV write error: {}", e)))?;
    }
    writer
        .flush()
        .map_err(|e| store_error(format!("CSV flush error: {}", e)))?;
    Ok(())
}
