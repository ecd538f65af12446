//! Errors surfaced by the budget ledger.

use thiserror::Error;

use super::mode::ExecutionMode;

/// Errors that can occur while configuring or mutating a ledger.
///
/// Over-budget admission outcomes are not errors: they come back in-band
/// through [`AdmissionDecision`](super::AdmissionDecision). The only
/// over-budget error is [`LedgerError::BudgetExceeded`], raised when the
/// ledger runs with `enforce_limit` turned on.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The configured limit was zero.
    #[error("budget limit must be greater than zero")]
    InvalidLimit,

    /// A threshold was not a finite fraction in (0, 1].
    #[error("{name} must be a fraction in (0, 1], got {value}")]
    InvalidThreshold {
        /// Which threshold was rejected.
        name: &'static str,
        /// The offending value.
        value: f64,
    },

    /// The critical threshold sits below the warning threshold.
    #[error("critical_threshold ({critical}) must be >= warning_threshold ({warning})")]
    InvertedThresholds { warning: f64, critical: f64 },

    /// The mode multipliers are zero or not increasing in cost.
    #[error("invalid cost table: {0}")]
    InvalidCostTable(String),

    /// Cost arithmetic overflowed the token counter.
    #[error("cost of {amount} tokens in {mode} mode overflows the ledger")]
    CostOverflow { amount: u64, mode: ExecutionMode },

    /// A mode name outside the known set.
    #[error("unknown execution mode: {0}")]
    UnknownMode(String),

    /// Strict mode refused a reservation or consumption.
    #[error("budget exceeded: requested {requested}, remaining {remaining}")]
    BudgetExceeded { requested: u64, remaining: u64 },

    /// Layered config loading failed.
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),

    /// TOML parsing failed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Reading a config file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A shared ledger's lock was poisoned by a panicking holder.
    #[error("ledger lock poisoned")]
    LockPoisoned,
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
