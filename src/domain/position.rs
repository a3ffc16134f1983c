//! Position lifecycle state machine.
//!
//! A position is owned by one simulation run and mutated only through the
//! transition methods here. Per period the transitions are evaluated in a
//! fixed priority order:
//!
//! 1. stop-loss breach: close everything
//! 2. trailing-stop breach (armed only once the position has been
//!    profitable): close everything remaining
//! 3. second take-profit level: close a 25% tranche once
//! 4. first take-profit level: close a 50% tranche once
//! 5. break-even ratchet: at 1:1 risk/reward, move the stop to entry
//!    (never reversed)
//! 6. momentum-exhaustion exit: close half of what remains
//!
//! A level of 0.0 disables its trigger. Tranches are fractions of the
//! initial share count; the exhaustion exit halves the remainder.

use chrono::NaiveDate;

pub const TP1_FRACTION: f64 = 0.50;
pub const TP2_FRACTION: f64 = 0.25;
pub const EXHAUSTION_FRACTION: f64 = 0.50;

const SHARE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    Open,
    PartialTp1,
    PartialTp2,
    Closed,
}

/// Immutable record of one (partial or full) close.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub symbol: String,
    pub shares: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub exit_date: NaiveDate,
    pub profit: f64,
    pub is_win: bool,
}

#[derive(Debug, Clone)]
pub struct Position {
    pub symbol: String,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub shares: f64,
    pub initial_shares: f64,
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    pub trailing_stop: f64,
    pub trailing_stop_pct: f64,
    pub state: PositionState,
    pub realized_pnl: f64,
    entry_cost: f64,
    initial_risk: f64,
    tp1_taken: bool,
    tp2_taken: bool,
}

impl Position {
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        symbol: &str,
        shares: f64,
        entry_price: f64,
        entry_date: NaiveDate,
        stop_loss: f64,
        take_profit_1: f64,
        take_profit_2: f64,
        trailing_stop_pct: f64,
        entry_cost: f64,
    ) -> Self {
        let initial_risk = if stop_loss > 0.0 {
            entry_price - stop_loss
        } else {
            0.0
        };
        Position {
            symbol: symbol.to_string(),
            entry_price,
            entry_date,
            shares,
            initial_shares: shares,
            stop_loss,
            take_profit_1,
            take_profit_2,
            trailing_stop: 0.0,
            trailing_stop_pct,
            state: PositionState::Open,
            realized_pnl: 0.0,
            entry_cost,
            initial_risk,
            tp1_taken: false,
            tp2_taken: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state == PositionState::Closed
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.shares * (price - self.entry_price)
    }

    fn stop_loss_hit(&self, close: f64) -> bool {
        self.stop_loss > 0.0 && close <= self.stop_loss
    }

    fn trailing_stop_hit(&self, close: f64) -> bool {
        self.trailing_stop > 0.0 && close <= self.trailing_stop
    }

    /// Advance the state machine by one period against the closing price.
    /// Returns one trade record per close executed this period.
    pub fn step(
        &mut self,
        date: NaiveDate,
        close: f64,
        exhaustion_exit: bool,
        cost_pct: f64,
    ) -> Vec<TradeRecord> {
        let mut fills = Vec::new();
        if self.is_closed() {
            return fills;
        }

        if self.stop_loss_hit(close) || self.trailing_stop_hit(close) {
            fills.push(self.close_all(close, date, cost_pct));
            return fills;
        }

        if !self.tp2_taken && self.take_profit_2 > 0.0 && close >= self.take_profit_2 {
            self.tp2_taken = true;
            // The tranche is a fraction of the initial size, but an earlier
            // exhaustion exit may have left less than that on the book.
            let quantity = (self.initial_shares * TP2_FRACTION).min(self.shares);
            fills.push(self.close_shares(quantity, close, date, cost_pct));
        }
        if !self.is_closed()
            && !self.tp1_taken
            && self.take_profit_1 > 0.0
            && close >= self.take_profit_1
        {
            self.tp1_taken = true;
            let quantity = (self.initial_shares * TP1_FRACTION).min(self.shares);
            fills.push(self.close_shares(quantity, close, date, cost_pct));
        }
        if !self.is_closed() && (self.tp1_taken || self.tp2_taken) {
            self.state = if self.tp2_taken {
                PositionState::PartialTp2
            } else {
                PositionState::PartialTp1
            };
        }

        // Break-even ratchet: once unrealized return reaches the initial
        // risk, the stop moves to entry and never back down.
        if self.initial_risk > 0.0
            && self.stop_loss < self.entry_price
            && close >= self.entry_price + self.initial_risk
        {
            self.stop_loss = self.entry_price;
        }

        if exhaustion_exit && !self.is_closed() {
            let quantity = self.shares * EXHAUSTION_FRACTION;
            fills.push(self.close_shares(quantity, close, date, cost_pct));
        }

        // Trailing stop arms once the position is profitable and ratchets
        // upward with price.
        if !self.is_closed() && self.trailing_stop_pct > 0.0 && close > self.entry_price {
            let candidate = close * (1.0 - self.trailing_stop_pct / 100.0);
            if candidate > self.trailing_stop {
                self.trailing_stop = candidate;
            }
        }

        fills
    }

    /// Close the whole remaining position, e.g. at simulation end.
    pub fn close_all(&mut self, price: f64, date: NaiveDate, cost_pct: f64) -> TradeRecord {
        self.close_shares(self.shares, price, date, cost_pct)
    }

    fn close_shares(
        &mut self,
        quantity: f64,
        price: f64,
        date: NaiveDate,
        cost_pct: f64,
    ) -> TradeRecord {
        assert!(
            quantity <= self.shares + SHARE_EPSILON,
            "attempt to close {} shares with only {} held",
            quantity,
            self.shares
        );
        // Absorb float dust only; a real overshoot fails the assert above.
        let quantity = quantity.min(self.shares);

        let exit_cost = quantity * price * cost_pct;
        let entry_cost_share = if self.initial_shares > 0.0 {
            self.entry_cost * (quantity / self.initial_shares)
        } else {
            0.0
        };
        let profit = quantity * (price - self.entry_price) - exit_cost - entry_cost_share;

        self.shares -= quantity;
        self.realized_pnl += profit;
        if self.shares <= SHARE_EPSILON {
            self.shares = 0.0;
            self.state = PositionState::Closed;
        }

        TradeRecord {
            symbol: self.symbol.clone(),
            shares: quantity,
            entry_price: self.entry_price,
            exit_price: price,
            exit_date: date,
            profit,
            is_win: profit > 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    /// Entry 100, stop 95, TP1 110, TP2 115: 1:2 and 1:3 reward levels.
    fn sample_position() -> Position {
        Position::open("TEST", 100.0, 100.0, date(1), 95.0, 110.0, 115.0, 10.0, 0.0)
    }

    #[test]
    fn stop_loss_closes_everything() {
        let mut pos = sample_position();
        let fills = pos.step(date(2), 94.0, false, 0.0);

        assert_eq!(fills.len(), 1);
        assert!(pos.is_closed());
        assert!((fills[0].shares - 100.0).abs() < 1e-9);
        assert!((fills[0].profit - (-600.0)).abs() < 1e-9);
        assert!(!fills[0].is_win);
    }

    #[test]
    fn tp1_closes_half_and_marks_state() {
        let mut pos = sample_position();
        let fills = pos.step(date(2), 110.0, false, 0.0);

        assert_eq!(fills.len(), 1);
        assert_eq!(pos.state, PositionState::PartialTp1);
        assert!((fills[0].shares - 50.0).abs() < 1e-9);
        assert!((pos.shares - 50.0).abs() < 1e-9);
        assert!((fills[0].profit - 500.0).abs() < 1e-9);
        assert!(fills[0].is_win);
    }

    #[test]
    fn tp1_tranche_fires_only_once() {
        let mut pos = sample_position();
        pos.step(date(2), 110.0, false, 0.0);
        let fills = pos.step(date(3), 111.0, false, 0.0);

        assert!(fills.is_empty());
        assert!((pos.shares - 50.0).abs() < 1e-9);
    }

    #[test]
    fn tp2_takes_additional_quarter() {
        let mut pos = sample_position();
        pos.step(date(2), 110.0, false, 0.0);
        let fills = pos.step(date(3), 115.0, false, 0.0);

        assert_eq!(fills.len(), 1);
        assert_eq!(pos.state, PositionState::PartialTp2);
        assert!((fills[0].shares - 25.0).abs() < 1e-9);
        assert!((pos.shares - 25.0).abs() < 1e-9);
    }

    #[test]
    fn gap_through_both_levels_takes_both_tranches() {
        let mut pos = sample_position();
        let fills = pos.step(date(2), 116.0, false, 0.0);

        assert_eq!(fills.len(), 2);
        assert_eq!(pos.state, PositionState::PartialTp2);
        assert!((pos.shares - 25.0).abs() < 1e-9);
    }

    #[test]
    fn break_even_ratchet_scenario() {
        // Entry 100, stop 95, TP1 110; path 100 -> 105 -> 110 -> 108.
        let mut pos = Position::open("TEST", 100.0, 100.0, date(1), 95.0, 110.0, 0.0, 0.0, 0.0);

        let fills = pos.step(date(2), 105.0, false, 0.0);
        assert!(fills.is_empty());
        // 1:1 risk/reward reached: stop moves to entry.
        assert!((pos.stop_loss - 100.0).abs() < 1e-9);

        let fills = pos.step(date(3), 110.0, false, 0.0);
        assert_eq!(fills.len(), 1);
        assert!((fills[0].shares - 50.0).abs() < 1e-9);

        let fills = pos.step(date(4), 108.0, false, 0.0);
        assert!(fills.is_empty());
        assert!((pos.shares - 50.0).abs() < 1e-9);
        assert_eq!(pos.state, PositionState::PartialTp1);
    }

    #[test]
    fn break_even_is_one_way() {
        let mut pos = Position::open("TEST", 100.0, 100.0, date(1), 95.0, 120.0, 0.0, 0.0, 0.0);
        pos.step(date(2), 106.0, false, 0.0);
        assert!((pos.stop_loss - 100.0).abs() < 1e-9);

        // Price falling back toward entry must not lower the stop.
        pos.step(date(3), 101.0, false, 0.0);
        assert!((pos.stop_loss - 100.0).abs() < 1e-9);
    }

    #[test]
    fn trailing_stop_arms_and_ratchets() {
        let mut pos = Position::open("TEST", 100.0, 100.0, date(1), 0.0, 0.0, 0.0, 10.0, 0.0);

        pos.step(date(2), 99.0, false, 0.0);
        assert!((pos.trailing_stop - 0.0).abs() < f64::EPSILON);

        pos.step(date(3), 110.0, false, 0.0);
        assert!((pos.trailing_stop - 99.0).abs() < 1e-9);

        pos.step(date(4), 120.0, false, 0.0);
        assert!((pos.trailing_stop - 108.0).abs() < 1e-9);

        // A pullback does not lower the trail.
        pos.step(date(5), 112.0, false, 0.0);
        assert!((pos.trailing_stop - 108.0).abs() < 1e-9);

        let fills = pos.step(date(6), 107.0, false, 0.0);
        assert_eq!(fills.len(), 1);
        assert!(pos.is_closed());
        assert!(fills[0].is_win);
    }

    #[test]
    fn exhaustion_halves_the_remainder() {
        let mut pos = sample_position();
        let fills = pos.step(date(2), 105.0, true, 0.0);

        assert_eq!(fills.len(), 1);
        assert!((fills[0].shares - 50.0).abs() < 1e-9);
        assert!((pos.shares - 50.0).abs() < 1e-9);

        let fills = pos.step(date(3), 105.0, true, 0.0);
        assert!((fills[0].shares - 25.0).abs() < 1e-9);
        assert!((pos.shares - 25.0).abs() < 1e-9);
    }

    #[test]
    fn stop_loss_takes_priority_over_take_profit() {
        // Degenerate levels where the close satisfies both stop and TP1.
        let mut pos = Position::open("TEST", 100.0, 100.0, date(1), 105.0, 104.0, 0.0, 0.0, 0.0);
        let fills = pos.step(date(2), 104.5, false, 0.0);

        assert_eq!(fills.len(), 1);
        assert!(pos.is_closed());
        assert!((fills[0].shares - 100.0).abs() < 1e-9);
    }

    #[test]
    fn transaction_costs_reduce_profit() {
        let mut pos = Position::open("TEST", 100.0, 100.0, date(1), 95.0, 110.0, 0.0, 0.0, 20.0);
        let fills = pos.step(date(2), 110.0, false, 0.001);

        // 50 shares * 10 gain - exit cost (50*110*0.001) - half the entry cost.
        let expected = 500.0 - 5.5 - 10.0;
        assert!((fills[0].profit - expected).abs() < 1e-9);
    }

    #[test]
    fn realized_pnl_accumulates() {
        let mut pos = sample_position();
        pos.step(date(2), 110.0, false, 0.0);
        pos.step(date(3), 115.0, false, 0.0);
        let record = pos.close_all(112.0, date(4), 0.0);

        // 50 @ +10, 25 @ +15, 25 @ +12
        assert!((pos.realized_pnl - (500.0 + 375.0 + 300.0)).abs() < 1e-9);
        assert!((record.profit - 300.0).abs() < 1e-9);
        assert!(pos.is_closed());
    }

    #[test]
    fn zero_levels_disable_triggers() {
        let mut pos = Position::open("TEST", 100.0, 100.0, date(1), 0.0, 0.0, 0.0, 0.0, 0.0);
        let fills = pos.step(date(2), 1.0, false, 0.0);
        assert!(fills.is_empty());
        let fills = pos.step(date(3), 1_000.0, false, 0.0);
        assert!(fills.is_empty());
        assert_eq!(pos.state, PositionState::Open);
    }

    #[test]
    #[should_panic(expected = "attempt to close")]
    fn overclose_is_fatal() {
        let mut pos = sample_position();
        pos.close_shares(150.0, 100.0, date(2), 0.0);
    }
}
