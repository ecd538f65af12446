//! Mode-weighted token budget ledger.
//!
//! See [`budget`] for the accounting model.

pub mod budget;

pub use budget::{
    AdmissionDecision, AlertLevel, BudgetLedger, BudgetStatus, ExecutionMode, LedgerConfig,
    LedgerError, LedgerResult, SharedBudgetLedger,
};
