//! Backtest simulator.
//!
//! Replays the scoring pipeline over history and threads one owned
//! [`Position`] through the simulation loop. Periods are processed in
//! chronological order; the cash ledger has a single writer (this loop).
//! Scoring re-runs every `rebalance_every` periods; position transitions run
//! every period. Any position still open at the end is force-closed.

use std::fmt;

use chrono::NaiveDate;

use crate::domain::candle::Candle;
use crate::domain::config::ScoringConfig;
use crate::domain::config_validation::validate_backtest_params;
use crate::domain::error::TidemarkError;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::metrics::{BacktestMetrics, EquityPoint};
use crate::domain::normalizer::{RSI_OVERBOUGHT, RSI_PERIOD};
use crate::domain::position::{Position, TradeRecord};
use crate::domain::recommendation::{recommend, Action};

/// Confidence floor imposed by the high-confidence strategy regardless of
/// the configured minimum.
pub const HIGH_CONFIDENCE_FLOOR: f64 = 0.8;

/// Short trend average for the momentum-exhaustion exit.
pub const EXHAUSTION_MA_PERIOD: usize = 10;

/// Reward multiples for the two take-profit levels (1:2 and 1:3).
const TP1_RISK_MULTIPLE: f64 = 2.0;
const TP2_RISK_MULTIPLE: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Enter whenever the scoring pipeline recommends a buy.
    FollowSignal,
    /// Like `FollowSignal` but requires confidence of at least 0.8.
    HighConfidence,
    /// Enter on the first period, exit at the end.
    BuyAndHold,
}

impl StrategyKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "follow_signal" => Some(StrategyKind::FollowSignal),
            "high_confidence" => Some(StrategyKind::HighConfidence),
            "buy_and_hold" => Some(StrategyKind::BuyAndHold),
            _ => None,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::FollowSignal => "follow_signal",
            StrategyKind::HighConfidence => "high_confidence",
            StrategyKind::BuyAndHold => "buy_and_hold",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestParams {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub strategy: StrategyKind,
    pub signal_threshold: f64,
    /// Fraction of equity risked per trade against the stop distance.
    pub risk_per_trade: f64,
    /// Cost charged on each side as a fraction of the notional.
    pub transaction_cost_pct: f64,
    pub min_confluence_score: f64,
    pub min_confidence: f64,
    pub stop_loss_pct: f64,
    pub trailing_stop_pct: f64,
    /// Scoring cadence in periods; position transitions run every period.
    pub rebalance_every: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub metrics: BacktestMetrics,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<TradeRecord>,
}

pub fn run_backtest(
    params: &BacktestParams,
    candles: &[Candle],
    scoring: &ScoringConfig,
) -> Result<BacktestReport, TidemarkError> {
    validate_backtest_params(params)?;

    let in_range: Vec<usize> = candles
        .iter()
        .enumerate()
        .filter(|(_, c)| c.date >= params.start_date && c.date <= params.end_date)
        .map(|(i, _)| i)
        .collect();
    if in_range.is_empty() {
        return Err(TidemarkError::NoData {
            symbol: params.symbol.clone(),
        });
    }

    // Exhaustion inputs are precomputed over the full series once.
    let rsi_series = calculate_rsi(candles, RSI_PERIOD);
    let exhaustion_ma = calculate_sma(candles, EXHAUSTION_MA_PERIOD);

    let mut cash = params.initial_capital;
    let mut position: Option<Position> = None;
    let mut trades: Vec<TradeRecord> = Vec::new();
    let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(in_range.len());
    let mut entered_once = false;

    for (period, &index) in in_range.iter().enumerate() {
        let candle = &candles[index];

        if let Some(pos) = position.as_mut() {
            let exhaustion = momentum_exhausted(&rsi_series, &exhaustion_ma, candles, index);
            let fills = pos.step(
                candle.date,
                candle.close,
                exhaustion,
                params.transaction_cost_pct,
            );
            for fill in &fills {
                cash += exit_proceeds(fill, params.transaction_cost_pct);
            }
            trades.extend(fills);
            if pos.is_closed() {
                position = None;
            }
        }

        if position.is_none() {
            match params.strategy {
                StrategyKind::BuyAndHold => {
                    if !entered_once {
                        position = enter_buy_and_hold(params, candle, &mut cash);
                        entered_once = position.is_some();
                    }
                }
                StrategyKind::FollowSignal | StrategyKind::HighConfidence => {
                    if period % params.rebalance_every == 0 {
                        position =
                            enter_on_signal(params, scoring, &candles[..=index], candle, &mut cash);
                    }
                }
            }
        }

        let equity = cash
            + position
                .as_ref()
                .map_or(0.0, |pos| pos.market_value(candle.close));
        equity_curve.push(EquityPoint {
            date: candle.date,
            value: equity,
        });
    }

    if let Some(mut pos) = position.take() {
        let last_candle = &candles[in_range[in_range.len() - 1]];
        let fill = pos.close_all(last_candle.close, last_candle.date, params.transaction_cost_pct);
        cash += exit_proceeds(&fill, params.transaction_cost_pct);
        trades.push(fill);
        if let Some(point) = equity_curve.last_mut() {
            point.value = cash;
        }
    }

    let metrics = BacktestMetrics::compute(&equity_curve, &trades, params.initial_capital);
    Ok(BacktestReport {
        metrics,
        equity_curve,
        trades,
    })
}

fn exit_proceeds(fill: &TradeRecord, cost_pct: f64) -> f64 {
    fill.shares * fill.exit_price * (1.0 - cost_pct)
}

/// Overbought oscillator that has started reversing, or price closing below
/// the short trend average.
fn momentum_exhausted(
    rsi: &[Option<f64>],
    short_ma: &[Option<f64>],
    candles: &[Candle],
    index: usize,
) -> bool {
    if index >= 1 {
        if let (Some(prev), Some(curr)) = (rsi[index - 1], rsi[index]) {
            if prev >= RSI_OVERBOUGHT && curr < prev {
                return true;
            }
        }
    }
    if let Some(average) = short_ma[index] {
        if candles[index].close < average {
            return true;
        }
    }
    false
}

/// Entry gate and sizing for the signal-driven strategies. Affordability
/// includes the entry cost, not just the notional.
fn enter_on_signal(
    params: &BacktestParams,
    scoring: &ScoringConfig,
    window: &[Candle],
    candle: &Candle,
    cash: &mut f64,
) -> Option<Position> {
    let config = ScoringConfig {
        signal_threshold: params.signal_threshold,
        ..scoring.clone()
    };
    let rec = recommend(&params.symbol, window, 0.0, &config);

    if rec.action != Action::Buy {
        return None;
    }
    if rec.composite_score < params.min_confluence_score {
        return None;
    }
    let confidence_floor = match params.strategy {
        StrategyKind::HighConfidence => params.min_confidence.max(HIGH_CONFIDENCE_FLOOR),
        _ => params.min_confidence,
    };
    if rec.confidence < confidence_floor {
        return None;
    }

    let price = candle.close;
    if price <= 0.0 {
        return None;
    }
    let stop = price * (1.0 - params.stop_loss_pct / 100.0);
    let per_share_risk = price - stop;
    if per_share_risk <= 0.0 {
        return None;
    }

    let mut shares = *cash * params.risk_per_trade / per_share_risk;
    let max_affordable = *cash / (price * (1.0 + params.transaction_cost_pct));
    shares = shares.min(max_affordable);
    if shares <= 0.0 {
        return None;
    }

    let notional = shares * price;
    let entry_cost = notional * params.transaction_cost_pct;
    *cash -= notional + entry_cost;

    Some(Position::open(
        &params.symbol,
        shares,
        price,
        candle.date,
        stop,
        price + TP1_RISK_MULTIPLE * per_share_risk,
        price + TP2_RISK_MULTIPLE * per_share_risk,
        params.trailing_stop_pct,
        entry_cost,
    ))
}

/// Buy-and-hold entry: full capital, no exit levels.
fn enter_buy_and_hold(
    params: &BacktestParams,
    candle: &Candle,
    cash: &mut f64,
) -> Option<Position> {
    let price = candle.close;
    if price <= 0.0 {
        return None;
    }
    let shares = *cash / (price * (1.0 + params.transaction_cost_pct));
    if shares <= 0.0 {
        return None;
    }

    let notional = shares * price;
    let entry_cost = notional * params.transaction_cost_pct;
    *cash -= notional + entry_cost;

    Some(Position::open(
        &params.symbol,
        shares,
        price,
        candle.date,
        0.0,
        0.0,
        0.0,
        0.0,
        entry_cost,
    ))
}
