//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_store_adapter::{write_equity_curve, CsvStoreAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config::ScoringConfig;
use crate::domain::error::TidemarkError;
use crate::domain::recommendation::recommend;
use crate::domain::simulator::{run_backtest, BacktestParams, StrategyKind};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;

#[derive(Parser, Debug)]
#[command(name = "tidemark", about = "Technical signal scoring and backtesting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score symbols and print recommendations
    Score {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Replay the scoring pipeline over history
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        /// Write the equity curve to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List symbols available in the data store
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate configuration without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Score { config, symbol } => run_score(&config, symbol.as_deref()),
        Command::Backtest {
            config,
            symbol,
            output,
        } => run_backtest_command(&config, symbol.as_deref(), output.as_deref()),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TidemarkError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Scoring defaults with `[scoring]` overrides applied.
pub fn build_scoring_config(config: &dyn ConfigPort) -> ScoringConfig {
    let defaults = ScoringConfig::default();
    ScoringConfig {
        signal_threshold: config.get_double(
            "scoring",
            "signal_threshold",
            defaults.signal_threshold,
        ),
        drift_band_pct: config.get_double("scoring", "drift_band_pct", defaults.drift_band_pct),
        ..defaults
    }
}

pub fn build_backtest_params(
    config: &dyn ConfigPort,
    symbol_override: Option<&str>,
) -> Result<BacktestParams, TidemarkError> {
    let symbol = match symbol_override {
        Some(s) => s.to_uppercase(),
        None => config.get_string("backtest", "symbol").ok_or_else(|| {
            TidemarkError::ConfigMissing {
                section: "backtest".into(),
                key: "symbol".into(),
            }
        })?,
    };

    let start_date = required_date(config, "start_date")?;
    let end_date = required_date(config, "end_date")?;

    let strategy_name = config
        .get_string("backtest", "strategy")
        .unwrap_or_else(|| "follow_signal".to_string());
    let strategy =
        StrategyKind::parse(&strategy_name).ok_or_else(|| TidemarkError::ConfigInvalid {
            section: "backtest".into(),
            key: "strategy".into(),
            reason: format!(
                "unknown strategy {:?} (expected follow_signal, high_confidence or buy_and_hold)",
                strategy_name
            ),
        })?;

    Ok(BacktestParams {
        symbol,
        start_date,
        end_date,
        initial_capital: config.get_double("backtest", "initial_capital", 100_000.0),
        strategy,
        signal_threshold: config.get_double("backtest", "signal_threshold", 30.0),
        risk_per_trade: config.get_double("backtest", "risk_per_trade", 0.02),
        transaction_cost_pct: config.get_double("backtest", "transaction_cost_pct", 0.001),
        min_confluence_score: config.get_double("backtest", "min_confluence_score", 40.0),
        min_confidence: config.get_double("backtest", "min_confidence", 0.3),
        stop_loss_pct: config.get_double("backtest", "stop_loss_pct", 5.0),
        trailing_stop_pct: config.get_double("backtest", "trailing_stop_pct", 10.0),
        rebalance_every: config.get_int("backtest", "rebalance_every", 5) as usize,
    })
}

fn required_date(config: &dyn ConfigPort, key: &str) -> Result<NaiveDate, TidemarkError> {
    let value =
        config
            .get_string("backtest", key)
            .ok_or_else(|| TidemarkError::ConfigMissing {
                section: "backtest".into(),
                key: key.into(),
            })?;
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|_| TidemarkError::ConfigInvalid {
        section: "backtest".into(),
        key: key.into(),
        reason: "invalid date format (expected YYYY-MM-DD)".into(),
    })
}

pub fn resolve_symbols(symbol_override: Option<&str>, config: &dyn ConfigPort) -> Vec<String> {
    if let Some(symbol) = symbol_override {
        return vec![symbol.to_uppercase()];
    }

    if let Some(symbols) = config.get_string("backtest", "symbols") {
        return symbols
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
    }

    if let Some(symbol) = config.get_string("backtest", "symbol") {
        let symbol = symbol.trim().to_uppercase();
        if !symbol.is_empty() {
            return vec![symbol];
        }
    }

    vec![]
}

/// Allocation drift supplied per symbol under `[portfolio]`, e.g.
/// `drift_aaa = -6.5`. Defaults to zero when absent.
pub fn allocation_drift_for(config: &dyn ConfigPort, symbol: &str) -> f64 {
    let key = format!("drift_{}", symbol.to_lowercase());
    config.get_double("portfolio", &key, 0.0)
}

fn run_score(config_path: &PathBuf, symbol_override: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let symbols = resolve_symbols(symbol_override, &config);
    if symbols.is_empty() {
        eprintln!("error: no symbols configured");
        return ExitCode::from(2);
    }

    let store = match CsvStoreAdapter::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let scoring = build_scoring_config(&config);
    eprintln!("Scoring {} symbols...", symbols.len());

    for symbol in &symbols {
        let candles = match store.get_history(symbol, NaiveDate::MIN, NaiveDate::MAX) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("warning: skipping {} ({})", symbol, e);
                continue;
            }
        };

        let drift = allocation_drift_for(&config, symbol);
        let rec = recommend(symbol, &candles, drift, &scoring);
        println!(
            "{}: {} ({}) strength {:+.0} confidence {:.2} score {:.1} drift {:+.1}% | {}",
            rec.symbol,
            rec.action,
            rec.priority,
            rec.signal_strength,
            rec.confidence,
            rec.composite_score,
            rec.allocation_drift,
            rec.reason,
        );
    }

    ExitCode::SUCCESS
}

fn run_backtest_command(
    config_path: &PathBuf,
    symbol_override: Option<&str>,
    output_path: Option<&std::path::Path>,
) -> ExitCode {
    // Stage 1: load and validate configuration.
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let params = match build_backtest_params(&config, symbol_override) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 2: fetch history, including lookback before the start date so
    // the scoring window is seeded from the first simulated period.
    let store = match CsvStoreAdapter::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let candles = match store.get_history(&params.symbol, NaiveDate::MIN, params.end_date) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "Running backtest: {} ({}), {} to {}, {} candles",
        params.symbol,
        params.strategy,
        params.start_date,
        params.end_date,
        candles.len(),
    );

    // Stage 3: simulate.
    let scoring = build_scoring_config(&config);
    let report = match run_backtest(&params, &candles, &scoring) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 4: print summary.
    let metrics = &report.metrics;
    eprintln!("\n=== Backtest Results ===");
    eprintln!("Total Return:     {:.2}%", metrics.total_return_pct);
    eprintln!("CAGR:             {:.2}%", metrics.cagr_pct);
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown_pct);
    eprintln!("Win Rate:         {:.1}%", metrics.win_rate_pct);
    eprintln!("Profit Factor:    {:.2}", metrics.profit_factor);
    eprintln!("Calmar Ratio:     {:.2}", metrics.calmar_ratio);
    eprintln!("Avg Trade Return: {:.2}%", metrics.avg_return_per_trade_pct);
    eprintln!("Total Trades:     {}", report.trades.len());

    // Stage 5: optional equity curve export.
    if let Some(path) = output_path {
        match write_equity_curve(path, &report.equity_curve) {
            Ok(()) => eprintln!("\nEquity curve written to: {}", path.display()),
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        }
    }

    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let store = match CsvStoreAdapter::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    match store.list_symbols() {
        Ok(symbols) => {
            if symbols.is_empty() {
                eprintln!("No symbols found in data store");
            } else {
                for symbol in &symbols {
                    println!("{}", symbol);
                }
                eprintln!("{} symbols found", symbols.len());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let params = match build_backtest_params(&config, None) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if let Err(e) = crate::domain::config_validation::validate_backtest_params(&params) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let scoring = build_scoring_config(&config);
    eprintln!("\nBacktest:");
    eprintln!("  symbol:    {}", params.symbol);
    eprintln!("  range:     {} to {}", params.start_date, params.end_date);
    eprintln!("  strategy:  {}", params.strategy);
    eprintln!("  capital:   {:.2}", params.initial_capital);
    eprintln!("Scoring:");
    eprintln!("  threshold: {}", scoring.signal_threshold);

    eprintln!("\nConfiguration is valid");
    ExitCode::SUCCESS
}
