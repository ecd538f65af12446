//! Execution modes and their cost multipliers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{LedgerError, LedgerResult};

/// Strategy an operation will run under.
///
/// Ordered cheapest first, so iterating [`ExecutionMode::ALL`] walks the
/// modes in ascending cost under the default table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Single conversational turn
    Chat,
    /// One agent working through a task
    SingleAgent,
    /// A coordinated group of agents
    MultiAgent,
}

impl ExecutionMode {
    /// Every mode, cheapest first.
    pub const ALL: [ExecutionMode; 3] = [
        ExecutionMode::Chat,
        ExecutionMode::SingleAgent,
        ExecutionMode::MultiAgent,
    ];

    /// Modes the admission check may suggest instead, in priority order.
    pub const FALLBACK_ORDER: [ExecutionMode; 2] =
        [ExecutionMode::Chat, ExecutionMode::SingleAgent];

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Chat => "chat",
            ExecutionMode::SingleAgent => "single_agent",
            ExecutionMode::MultiAgent => "multi_agent",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "chat" => Ok(ExecutionMode::Chat),
            "single_agent" => Ok(ExecutionMode::SingleAgent),
            "multi_agent" => Ok(ExecutionMode::MultiAgent),
            _ => Err(LedgerError::UnknownMode(s.to_string())),
        }
    }
}

/// Cost multiplier per execution mode.
///
/// A ledger copies its table at construction and never changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeCostTable {
    pub chat: u64,
    pub single_agent: u64,
    pub multi_agent: u64,
}

impl ModeCostTable {
    /// The standard multipliers: chat 1, single agent 4, multi agent 15.
    pub const STANDARD: ModeCostTable = ModeCostTable {
        chat: 1,
        single_agent: 4,
        multi_agent: 15,
    };

    /// Multiplier applied to raw tokens for `mode`.
    pub fn multiplier(&self, mode: ExecutionMode) -> u64 {
        match mode {
            ExecutionMode::Chat => self.chat,
            ExecutionMode::SingleAgent => self.single_agent,
            ExecutionMode::MultiAgent => self.multi_agent,
        }
    }

    /// Reject zero multipliers and tables that are not strictly increasing
    /// from chat to multi agent. Fallback search depends on that ordering.
    pub fn validate(&self) -> LedgerResult<()> {
        if let Some(mode) = ExecutionMode::ALL
            .into_iter()
            .find(|mode| self.multiplier(*mode) == 0)
        {
            return Err(LedgerError::InvalidCostTable(format!(
                "{} multiplier must be positive",
                mode
            )));
        }
        for pair in ExecutionMode::ALL.windows(2) {
            let (cheaper, pricier) = (pair[0], pair[1]);
            if self.multiplier(cheaper) >= self.multiplier(pricier) {
                return Err(LedgerError::InvalidCostTable(format!(
                    "{} multiplier ({}) must be below {} multiplier ({})",
                    cheaper,
                    self.multiplier(cheaper),
                    pricier,
                    self.multiplier(pricier)
                )));
            }
        }
        Ok(())
    }

    /// Weighted cost of `amount` raw tokens, `None` on overflow.
    pub fn cost(&self, amount: u64, mode: ExecutionMode) -> Option<u64> {
        amount.checked_mul(self.multiplier(mode))
    }
}

impl Default for ModeCostTable {
    fn default() -> Self {
        Self::STANDARD
    }
}
