//! Market data access port.
//!
//! The engine never fetches data itself; a provider failure surfaces as
//! `NoData`/`InsufficientData`, never as a fatal error inside the core.

use crate::domain::candle::Candle;
use crate::domain::error::TidemarkError;
use chrono::NaiveDate;

pub trait MarketDataPort {
    /// Candles for a symbol within the inclusive date range, ascending by
    /// date. Gaps are acceptable.
    fn get_history(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Candle>, TidemarkError>;

    /// Most recent known price for a symbol.
    fn get_price(&self, symbol: &str) -> Result<f64, TidemarkError>;

    fn list_symbols(&self) -> Result<Vec<String>, TidemarkError>;
}
