//! Performance metrics over an equity curve and trade history.
//!
//! The annualization factor is derived from the curve itself: elapsed
//! calendar time between the first and last points and the observed number
//! of periods. Rebalancing weekly and sampling daily therefore cannot be
//! annualized with the wrong constant.

use chrono::NaiveDate;

use crate::domain::position::TradeRecord;

const DAYS_PER_YEAR: f64 = 365.25;

/// One point of portfolio value; the curve is ascending by date.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestMetrics {
    pub total_return_pct: f64,
    pub cagr_pct: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown_pct: f64,
    pub win_rate_pct: f64,
    pub profit_factor: f64,
    pub calmar_ratio: f64,
    pub avg_return_per_trade_pct: f64,
}

impl BacktestMetrics {
    pub fn compute(
        equity_curve: &[EquityPoint],
        trades: &[TradeRecord],
        initial_capital: f64,
    ) -> Self {
        let final_value = equity_curve
            .last()
            .map_or(initial_capital, |point| point.value);

        let total_return_pct = if initial_capital > 0.0 {
            (final_value - initial_capital) / initial_capital * 100.0
        } else {
            0.0
        };

        let (cagr_pct, sharpe_ratio) = compute_time_metrics(equity_curve);
        let max_drawdown_pct = compute_max_drawdown(equity_curve);
        let (win_rate_pct, profit_factor, avg_return_per_trade_pct) = compute_trade_stats(trades);

        let calmar_ratio = if max_drawdown_pct > 0.0 {
            cagr_pct / max_drawdown_pct
        } else {
            cagr_pct
        };

        BacktestMetrics {
            total_return_pct,
            cagr_pct,
            sharpe_ratio,
            max_drawdown_pct,
            win_rate_pct,
            profit_factor,
            calmar_ratio,
            avg_return_per_trade_pct,
        }
    }
}

fn compute_time_metrics(equity_curve: &[EquityPoint]) -> (f64, f64) {
    if equity_curve.len() < 2 {
        return (0.0, 0.0);
    }

    let first = &equity_curve[0];
    let last = &equity_curve[equity_curve.len() - 1];
    let elapsed_days = (last.date - first.date).num_days() as f64;
    if elapsed_days <= 0.0 {
        return (0.0, 0.0);
    }
    let years = elapsed_days / DAYS_PER_YEAR;
    let periods_per_year = (equity_curve.len() - 1) as f64 / years;

    let cagr_pct = if first.value > 0.0 && last.value > 0.0 {
        ((last.value / first.value).powf(1.0 / years) - 1.0) * 100.0
    } else {
        0.0
    };

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|pair| {
            if pair[0].value > 0.0 {
                (pair[1].value - pair[0].value) / pair[0].value
            } else {
                0.0
            }
        })
        .collect();

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let sharpe_ratio = if stddev > 0.0 {
        mean / stddev * periods_per_year.sqrt()
    } else {
        0.0
    };

    (cagr_pct, sharpe_ratio)
}

fn compute_max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    if equity_curve.is_empty() {
        return 0.0;
    }

    let mut peak = equity_curve[0].value;
    let mut max_dd = 0.0_f64;

    for point in equity_curve {
        if point.value > peak {
            peak = point.value;
        } else if peak > 0.0 {
            let dd = (peak - point.value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd * 100.0
}

fn compute_trade_stats(trades: &[TradeRecord]) -> (f64, f64, f64) {
    let mut wins = 0usize;
    let mut losses = 0usize;
    let mut total_profit = 0.0_f64;
    let mut total_loss = 0.0_f64;
    let mut return_sum = 0.0_f64;

    for trade in trades {
        if trade.profit > 0.0 {
            wins += 1;
            total_profit += trade.profit;
        } else if trade.profit < 0.0 {
            losses += 1;
            total_loss += -trade.profit;
        }
        // Zero-profit trades count in neither bucket.

        let notional = trade.entry_price * trade.shares;
        if notional > 0.0 {
            return_sum += trade.profit / notional * 100.0;
        }
    }

    let decided = wins + losses;
    let win_rate_pct = if decided > 0 {
        wins as f64 / decided as f64 * 100.0
    } else {
        0.0
    };

    let profit_factor = if total_loss > 0.0 {
        total_profit / total_loss
    } else {
        // No losses: report the raw profit rather than infinity.
        total_profit
    };

    let avg_return_per_trade_pct = if trades.is_empty() {
        0.0
    } else {
        return_sum / trades.len() as f64
    };

    (win_rate_pct, profit_factor, avg_return_per_trade_pct)
}
