//! Backtest parameter validation.
//!
//! Every invalid parameter is rejected here, before the simulation starts;
//! nothing is discovered mid-run.

use crate::domain::error::TidemarkError;
use crate::domain::simulator::BacktestParams;

pub fn validate_backtest_params(params: &BacktestParams) -> Result<(), TidemarkError> {
    validate_symbol(params)?;
    validate_dates(params)?;
    validate_capital(params)?;
    validate_risk(params)?;
    validate_costs(params)?;
    validate_thresholds(params)?;
    validate_stops(params)?;
    validate_cadence(params)?;
    Ok(())
}

fn invalid(key: &str, reason: &str) -> TidemarkError {
    TidemarkError::ConfigInvalid {
        section: "backtest".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_symbol(params: &BacktestParams) -> Result<(), TidemarkError> {
    if params.symbol.trim().is_empty() {
        return Err(invalid("symbol", "symbol must not be empty"));
    }
    Ok(())
}

fn validate_dates(params: &BacktestParams) -> Result<(), TidemarkError> {
    if params.start_date >= params.end_date {
        return Err(invalid("start_date", "start_date must be before end_date"));
    }
    Ok(())
}

fn validate_capital(params: &BacktestParams) -> Result<(), TidemarkError> {
    if params.initial_capital <= 0.0 {
        return Err(invalid("initial_capital", "initial_capital must be positive"));
    }
    Ok(())
}

fn validate_risk(params: &BacktestParams) -> Result<(), TidemarkError> {
    if params.risk_per_trade <= 0.0 || params.risk_per_trade > 1.0 {
        return Err(invalid(
            "risk_per_trade",
            "risk_per_trade must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_costs(params: &BacktestParams) -> Result<(), TidemarkError> {
    if params.transaction_cost_pct < 0.0 || params.transaction_cost_pct >= 1.0 {
        return Err(invalid(
            "transaction_cost_pct",
            "transaction_cost_pct must be in [0, 1)",
        ));
    }
    Ok(())
}

fn validate_thresholds(params: &BacktestParams) -> Result<(), TidemarkError> {
    if params.signal_threshold < 0.0 || params.signal_threshold > 100.0 {
        return Err(invalid(
            "signal_threshold",
            "signal_threshold must be in [0, 100]",
        ));
    }
    if params.min_confluence_score < 0.0 || params.min_confluence_score > 100.0 {
        return Err(invalid(
            "min_confluence_score",
            "min_confluence_score must be in [0, 100]",
        ));
    }
    if params.min_confidence < 0.0 || params.min_confidence > 1.0 {
        return Err(invalid(
            "min_confidence",
            "min_confidence must be in [0, 1]",
        ));
    }
    Ok(())
}

fn validate_stops(params: &BacktestParams) -> Result<(), TidemarkError> {
    if params.stop_loss_pct <= 0.0 || params.stop_loss_pct >= 100.0 {
        return Err(invalid("stop_loss_pct", "stop_loss_pct must be in (0, 100)"));
    }
    if params.trailing_stop_pct < 0.0 || params.trailing_stop_pct >= 100.0 {
        return Err(invalid(
            "trailing_stop_pct",
            "trailing_stop_pct must be in [0, 100)",
        ));
    }
    Ok(())
}

fn validate_cadence(params: &BacktestParams) -> Result<(), TidemarkError> {
    if params.rebalance_every == 0 {
        return Err(invalid("rebalance_every", "rebalance_every must be at least 1"));
    }
    Ok(())
}
