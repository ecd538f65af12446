//! Admission decisions returned by `can_execute`.

use serde::{Deserialize, Serialize};

use super::mode::ExecutionMode;

/// Reason given when nothing fits the remaining budget.
pub const BUDGET_EXCEEDED_REASON: &str = "Budget exceeded";

/// Outcome of an admission check for a proposed operation.
///
/// A refused decision either names a cheaper `fallback` mode that fits or
/// carries [`BUDGET_EXCEEDED_REASON`]. Neither case is enforced: the caller
/// decides whether to downgrade, abort, or run anyway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionDecision {
    /// Whether the operation fits in the remaining budget as requested
    pub allowed: bool,
    /// Weighted cost of the operation in the requested mode
    pub estimated_cost: u64,
    /// Cheaper mode that would fit, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<ExecutionMode>,
    /// Human-readable explanation for a refusal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AdmissionDecision {
    /// The operation fits.
    pub fn allow(estimated_cost: u64) -> Self {
        Self {
            allowed: true,
            estimated_cost,
            fallback: None,
            reason: None,
        }
    }

    /// The operation does not fit, but `mode` does.
    pub fn fallback(estimated_cost: u64, mode: ExecutionMode) -> Self {
        Self {
            allowed: false,
            estimated_cost,
            fallback: Some(mode),
            reason: Some(format!("Use {} mode", mode)),
        }
    }

    /// Nothing fits, or fallback is disabled.
    pub fn deny(estimated_cost: u64) -> Self {
        Self {
            allowed: false,
            estimated_cost,
            fallback: None,
            reason: Some(BUDGET_EXCEEDED_REASON.to_string()),
        }
    }

    /// Mode the caller should run in, if any: the requested one when
    /// allowed, otherwise the suggested fallback.
    pub fn effective_mode(&self, requested: ExecutionMode) -> Option<ExecutionMode> {
        if self.allowed {
            Some(requested)
        } else {
            self.fallback
        }
    }
}
