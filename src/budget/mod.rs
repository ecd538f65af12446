//! Token budget accounting for agent orchestration.
//!
//! This module tracks weighted token consumption against a fixed budget,
//! raises alerts as usage approaches the limit, and answers the question
//! "can this operation run, and if not, what cheaper mode could?".
//!
//! # Overview
//!
//! - **ExecutionMode** / **ModeCostTable**: cost multiplier per mode
//!   (chat 1, single agent 4, multi agent 15)
//! - **LedgerConfig**: limit, thresholds, fallback and enforcement policy
//! - **BudgetLedger**: the accounting itself
//! - **SharedBudgetLedger**: the ledger behind a lock for multi-threaded callers
//!
//! The limit is advisory unless `enforce_limit` is set: `reserve` and
//! `consume` charge whatever they are given, and callers are expected to
//! check [`BudgetLedger::can_execute`] first.
//!
//! # Example
//!
//! ```
//! use tokenledger::budget::{BudgetLedger, ExecutionMode, LedgerConfig};
//!
//! let mut ledger = BudgetLedger::new(LedgerConfig::new(10_000))?;
//!
//! let decision = ledger.can_execute(5_000, ExecutionMode::MultiAgent)?;
//! let mode = decision
//!     .effective_mode(ExecutionMode::MultiAgent)
//!     .unwrap_or(ExecutionMode::Chat);
//! assert_eq!(mode, ExecutionMode::Chat);
//!
//! ledger.reserve(5_000, mode)?;
//! assert_eq!(ledger.status().used, 5_000);
//! # Ok::<(), tokenledger::budget::LedgerError>(())
//! ```

mod alert;
mod config;
mod decision;
mod error;
mod mode;
mod tracker;

pub use alert::{Alert, AlertLevel};
pub use config::{LedgerConfig, DEFAULT_CRITICAL_THRESHOLD, DEFAULT_WARNING_THRESHOLD, ENV_PREFIX};
pub use decision::{AdmissionDecision, BUDGET_EXCEEDED_REASON};
pub use error::{LedgerError, LedgerResult};
pub use mode::{ExecutionMode, ModeCostTable};
pub use tracker::{BudgetLedger, BudgetStatus, LedgerSummary, ReservationId, SharedBudgetLedger};
