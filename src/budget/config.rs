//! Ledger configuration.

use std::env;
use std::fs;
use std::path::Path;

use config::{Config, Environment};
use serde::{Deserialize, Serialize};

use super::error::{LedgerError, LedgerResult};
use super::mode::ModeCostTable;

/// Prefix for environment overrides, e.g. `TOKENLEDGER_DEFAULT_BUDGET`.
pub const ENV_PREFIX: &str = "TOKENLEDGER";

/// Default warning threshold (70% of the budget).
pub const DEFAULT_WARNING_THRESHOLD: f64 = 0.7;

/// Default critical threshold (90% of the budget).
pub const DEFAULT_CRITICAL_THRESHOLD: f64 = 0.9;

/// Configuration for a [`BudgetLedger`](super::BudgetLedger).
///
/// `default_budget` has no sensible default and is left at 0 by
/// [`Default`]; [`validate`](Self::validate) rejects it until it is set.
/// Keys are accepted in snake_case or in the camelCase spelling
/// (`defaultBudget`, `warningThreshold`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Total token budget for the ledger's period
    #[serde(alias = "defaultBudget")]
    pub default_budget: u64,

    /// Fraction of the budget at which usage is reported as a warning
    #[serde(alias = "warningThreshold")]
    pub warning_threshold: f64,

    /// Fraction of the budget at which usage is reported as critical
    #[serde(alias = "criticalThreshold")]
    pub critical_threshold: f64,

    /// Whether admission checks suggest a cheaper mode when over budget
    #[serde(alias = "enableAutoFallback")]
    pub enable_auto_fallback: bool,

    /// Refuse reservations and consumption that would overrun the budget.
    /// Off by default: the limit is advisory and callers gate on
    /// `can_execute`.
    #[serde(alias = "enforceLimit")]
    pub enforce_limit: bool,

    /// Mode multipliers
    #[serde(alias = "costTable")]
    pub cost_table: ModeCostTable,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_budget: 0,
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            critical_threshold: DEFAULT_CRITICAL_THRESHOLD,
            enable_auto_fallback: true,
            enforce_limit: false,
            cost_table: ModeCostTable::STANDARD,
        }
    }
}

impl LedgerConfig {
    /// Create a config with the given budget and default thresholds.
    pub fn new(default_budget: u64) -> Self {
        Self {
            default_budget,
            ..Self::default()
        }
    }

    /// Earlier alerts and a hard limit.
    pub fn conservative(default_budget: u64) -> Self {
        Self {
            default_budget,
            warning_threshold: 0.5,
            critical_threshold: 0.8,
            enable_auto_fallback: true,
            enforce_limit: true,
            cost_table: ModeCostTable::STANDARD,
        }
    }

    /// Late alerts, advisory limit.
    pub fn relaxed(default_budget: u64) -> Self {
        Self {
            default_budget,
            warning_threshold: 0.8,
            critical_threshold: 0.95,
            ..Self::default()
        }
    }

    /// Set the total token budget.
    pub fn with_budget(mut self, tokens: u64) -> Self {
        self.default_budget = tokens;
        self
    }

    /// Set the warning threshold.
    pub fn with_warning_threshold(mut self, threshold: f64) -> Self {
        self.warning_threshold = threshold;
        self
    }

    /// Set the critical threshold.
    pub fn with_critical_threshold(mut self, threshold: f64) -> Self {
        self.critical_threshold = threshold;
        self
    }

    /// Enable or disable fallback suggestions.
    pub fn with_auto_fallback(mut self, enabled: bool) -> Self {
        self.enable_auto_fallback = enabled;
        self
    }

    /// Enable or disable hard enforcement in `reserve`/`consume`.
    pub fn with_enforce_limit(mut self, enforce: bool) -> Self {
        self.enforce_limit = enforce;
        self
    }

    /// Replace the mode multipliers.
    pub fn with_cost_table(mut self, table: ModeCostTable) -> Self {
        self.cost_table = table;
        self
    }

    /// Validate configuration before a ledger is built from it.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.default_budget == 0 {
            return Err(LedgerError::InvalidLimit);
        }
        check_fraction("warning_threshold", self.warning_threshold)?;
        check_fraction("critical_threshold", self.critical_threshold)?;
        if self.critical_threshold < self.warning_threshold {
            return Err(LedgerError::InvertedThresholds {
                warning: self.warning_threshold,
                critical: self.critical_threshold,
            });
        }
        self.cost_table.validate()?;
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> LedgerResult<Self> {
        let config: LedgerConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML config file, with `TOKENLEDGER_*` environment
    /// variables layered on top.
    ///
    /// The file is parsed with the same key spellings as
    /// [`from_toml_str`](Self::from_toml_str) before layering, since the
    /// layered sources match keys case-insensitively.
    pub fn load(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let from_file: LedgerConfig = toml::from_str(&contents)?;
        let settings = Config::builder()
            .add_source(Config::try_from(&from_file)?)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        let config: LedgerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Build config from environment variables over the defaults.
    ///
    /// Unparseable values are ignored. The result is not validated.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(format!("{}_{}", ENV_PREFIX, name).as_str());
        let defaults = Self::default();
        Self {
            default_budget: var("DEFAULT_BUDGET")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.default_budget),
            warning_threshold: var("WARNING_THRESHOLD")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.warning_threshold),
            critical_threshold: var("CRITICAL_THRESHOLD")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.critical_threshold),
            enable_auto_fallback: var("ENABLE_AUTO_FALLBACK")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.enable_auto_fallback),
            enforce_limit: var("ENFORCE_LIMIT")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.enforce_limit),
            cost_table: defaults.cost_table,
        }
    }
}

fn check_fraction(name: &'static str, value: f64) -> LedgerResult<()> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(LedgerError::InvalidThreshold { name, value })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
