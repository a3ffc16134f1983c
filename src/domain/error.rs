//! Domain error types.
//!
//! Expected conditions (missing data, short history, bad configuration) are
//! `Err` values. Simulation invariant violations are panics, not errors:
//! they indicate a bug in the state machine, never a recoverable input.

/// Top-level error type for tidemark.
#[derive(Debug, thiserror::Error)]
pub enum TidemarkError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient history: have {bars} candles, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("data store error: {reason}")]
    Store { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TidemarkError> for std::process::ExitCode {
    fn from(err: &TidemarkError) -> Self {
        let code: u8 = match err {
            TidemarkError::Io(_) => 1,
            TidemarkError::ConfigParse { .. }
            | TidemarkError::ConfigMissing { .. }
            | TidemarkError::ConfigInvalid { .. } => 2,
            TidemarkError::Store { .. } => 3,
            TidemarkError::NoData { .. } | TidemarkError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
