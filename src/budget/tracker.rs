//! Budget ledger: accounting, alerting and admission.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::alert::{Alert, AlertLevel};
use super::config::LedgerConfig;
use super::decision::AdmissionDecision;
use super::error::{LedgerError, LedgerResult};
use super::mode::ExecutionMode;

static RESERVATION_SEQ: AtomicU64 = AtomicU64::new(0);

/// Opaque identifier returned by [`BudgetLedger::reserve`].
///
/// Unique for the lifetime of the process. It identifies a reservation in
/// logs and caller bookkeeping; nothing in the ledger accepts it back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(String);

impl ReservationId {
    fn next() -> Self {
        let seq = RESERVATION_SEQ.fetch_add(1, Ordering::Relaxed);
        Self(format!("rsv-{}-{}", Utc::now().timestamp_millis(), seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Point-in-time view of budget usage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    /// Weighted tokens spent so far
    pub used: u64,
    /// Tokens left before the limit, zero once overrun
    pub remaining: u64,
    /// `used / limit`, clamped to 1.0
    pub percentage: f64,
    /// Current alert, if any threshold has been crossed
    pub alert_level: Option<AlertLevel>,
}

/// Token budget ledger for one budget period.
///
/// Mutations take `&mut self` and there is no internal locking; wrap the
/// ledger in [`SharedBudgetLedger`] to share it across threads.
#[derive(Debug, Clone)]
pub struct BudgetLedger {
    config: LedgerConfig,
    used: u64,
    alerts: Vec<Alert>,
    usage_by_mode: BTreeMap<ExecutionMode, u64>,
    reservations: u64,
}

impl BudgetLedger {
    /// Create a ledger, rejecting invalid configuration.
    pub fn new(config: LedgerConfig) -> LedgerResult<Self> {
        config.validate()?;
        tracing::info!(
            limit = config.default_budget,
            warning_threshold = config.warning_threshold,
            critical_threshold = config.critical_threshold,
            auto_fallback = config.enable_auto_fallback,
            enforce_limit = config.enforce_limit,
            "Budget ledger created"
        );
        Ok(Self {
            config,
            used: 0,
            alerts: Vec::new(),
            usage_by_mode: BTreeMap::new(),
            reservations: 0,
        })
    }

    /// Create a ledger with default thresholds for the given budget.
    pub fn with_budget(limit: u64) -> LedgerResult<Self> {
        Self::new(LedgerConfig::new(limit))
    }

    /// Weighted cost of `amount` raw tokens in `mode`.
    pub fn estimate_cost(&self, amount: u64, mode: ExecutionMode) -> LedgerResult<u64> {
        self.config
            .cost_table
            .cost(amount, mode)
            .ok_or(LedgerError::CostOverflow { amount, mode })
    }

    /// Current usage snapshot. Does not record alerts.
    pub fn status(&self) -> BudgetStatus {
        BudgetStatus {
            used: self.used,
            remaining: self.remaining(),
            percentage: self.ratio().min(1.0),
            alert_level: self.alert_level(),
        }
    }

    /// Current alert level, evaluated on the unclamped usage ratio.
    pub fn alert_level(&self) -> Option<AlertLevel> {
        AlertLevel::evaluate(
            self.ratio(),
            self.config.warning_threshold,
            self.config.critical_threshold,
        )
    }

    /// Check whether an operation fits, suggesting a cheaper mode if not.
    pub fn can_execute(&self, amount: u64, mode: ExecutionMode) -> LedgerResult<AdmissionDecision> {
        let estimated_cost = self.estimate_cost(amount, mode)?;

        if self.fits(estimated_cost) {
            return Ok(AdmissionDecision::allow(estimated_cost));
        }

        if self.config.enable_auto_fallback {
            if let Some(fallback) = self.find_fallback(amount) {
                tracing::warn!(
                    requested = %mode,
                    %fallback,
                    estimated_cost,
                    remaining = self.remaining(),
                    "Operation over budget, suggesting fallback mode"
                );
                return Ok(AdmissionDecision::fallback(estimated_cost, fallback));
            }
        }

        tracing::warn!(
            requested = %mode,
            estimated_cost,
            remaining = self.remaining(),
            "Operation over budget, no fallback available"
        );
        Ok(AdmissionDecision::deny(estimated_cost))
    }

    /// Charge an operation and return an identifier for it.
    ///
    /// The cost is committed immediately. Unless `enforce_limit` is set the
    /// limit is not checked; gate calls on [`can_execute`](Self::can_execute).
    pub fn reserve(&mut self, amount: u64, mode: ExecutionMode) -> LedgerResult<ReservationId> {
        let cost = self.charge(amount, mode)?;
        let id = ReservationId::next();
        self.reservations += 1;
        tracing::debug!(
            reservation = %id,
            %mode,
            amount,
            cost,
            used = self.used,
            "Reserved tokens"
        );
        Ok(id)
    }

    /// Charge an operation. Same accounting as [`reserve`](Self::reserve).
    pub fn consume(&mut self, amount: u64, mode: ExecutionMode) -> LedgerResult<()> {
        let cost = self.charge(amount, mode)?;
        tracing::debug!(%mode, amount, cost, used = self.used, "Consumed tokens");
        Ok(())
    }

    /// Admission check and reservation in one step.
    ///
    /// Reserves only when the operation is allowed as requested; a fallback
    /// suggestion is returned without charging anything.
    pub fn reserve_if_allowed(
        &mut self,
        amount: u64,
        mode: ExecutionMode,
    ) -> LedgerResult<(AdmissionDecision, Option<ReservationId>)> {
        let decision = self.can_execute(amount, mode)?;
        if !decision.allowed {
            return Ok((decision, None));
        }
        let id = self.reserve(amount, mode)?;
        Ok((decision, Some(id)))
    }

    /// Start a new budget period with the same configuration.
    pub fn reset(&mut self) {
        let previous = self.used;
        self.used = 0;
        self.alerts.clear();
        self.usage_by_mode.clear();
        self.reservations = 0;
        tracing::info!(
            previous_used = previous,
            limit = self.config.default_budget,
            "Budget ledger reset"
        );
    }

    fn charge(&mut self, amount: u64, mode: ExecutionMode) -> LedgerResult<u64> {
        let cost = self.estimate_cost(amount, mode)?;
        let used = self
            .used
            .checked_add(cost)
            .ok_or(LedgerError::CostOverflow { amount, mode })?;

        if self.config.enforce_limit && used > self.config.default_budget {
            return Err(LedgerError::BudgetExceeded {
                requested: cost,
                remaining: self.remaining(),
            });
        }

        let before = self.alert_level();
        self.used = used;
        *self.usage_by_mode.entry(mode).or_insert(0) += cost;
        self.record_transition(before);
        Ok(cost)
    }

    fn record_transition(&mut self, before: Option<AlertLevel>) {
        let after = self.alert_level();
        if after == before {
            return;
        }
        if let Some(level) = after {
            let alert = Alert::new(level, self.used, self.config.default_budget);
            tracing::warn!(
                level = level.label(),
                used = alert.used,
                limit = alert.limit,
                "Budget alert: {:.1}% of budget used",
                alert.ratio * 100.0
            );
            self.alerts.push(alert);
        }
    }

    /// Whether `cost` more tokens keeps usage at or under the limit.
    fn fits(&self, cost: u64) -> bool {
        self.used
            .checked_add(cost)
            .is_some_and(|total| total <= self.config.default_budget)
    }

    fn find_fallback(&self, amount: u64) -> Option<ExecutionMode> {
        ExecutionMode::FALLBACK_ORDER.into_iter().find(|mode| {
            self.config
                .cost_table
                .cost(amount, *mode)
                .is_some_and(|cost| self.fits(cost))
        })
    }

    fn ratio(&self) -> f64 {
        self.used as f64 / self.config.default_budget as f64
    }

    /// Tokens left before the limit.
    pub fn remaining(&self) -> u64 {
        self.config.default_budget.saturating_sub(self.used)
    }

    /// Weighted tokens spent this period.
    pub fn used(&self) -> u64 {
        self.used
    }

    /// Total token budget for the period.
    pub fn limit(&self) -> u64 {
        self.config.default_budget
    }

    /// Weighted tokens spent in `mode` this period.
    pub fn usage_for(&self, mode: ExecutionMode) -> u64 {
        self.usage_by_mode.get(&mode).copied().unwrap_or(0)
    }

    /// Alerts recorded this period, oldest first.
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// Get the configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Get a summary of budget usage.
    pub fn summary(&self) -> LedgerSummary {
        let status = self.status();
        LedgerSummary {
            used: status.used,
            limit: self.config.default_budget,
            remaining: status.remaining,
            percentage: status.percentage,
            alert_level: status.alert_level,
            usage_by_mode: self.usage_by_mode.clone(),
            reservations: self.reservations,
            alerts_recorded: self.alerts.len(),
        }
    }
}

/// Summary of budget usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub used: u64,
    pub limit: u64,
    pub remaining: u64,
    pub percentage: f64,
    pub alert_level: Option<AlertLevel>,
    pub usage_by_mode: BTreeMap<ExecutionMode, u64>,
    pub reservations: u64,
    pub alerts_recorded: usize,
}

impl LedgerSummary {
    /// Format as a human-readable string.
    pub fn format(&self) -> String {
        let mut output = String::from("## Token Budget Summary\n\n");

        output.push_str(&format!(
            "**Budget**: {}/{} ({:.1}%) [{}]\n",
            self.used,
            self.limit,
            self.percentage * 100.0,
            self.alert_level.map(|l| l.label()).unwrap_or("OK")
        ));
        output.push_str(&format!("**Remaining**: {}\n", self.remaining));

        for (mode, cost) in &self.usage_by_mode {
            output.push_str(&format!("**{}**: {}\n", mode, cost));
        }

        output.push_str(&format!("**Reservations**: {}\n", self.reservations));

        if self.alerts_recorded > 0 {
            output.push_str(&format!("**Alerts Recorded**: {}\n", self.alerts_recorded));
        }

        output
    }

    /// Serialize as JSON.
    pub fn to_json(&self) -> LedgerResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Thread-safe budget ledger.
///
/// Every call takes the lock once, so a check-and-reserve done through
/// [`reserve_if_allowed`](Self::reserve_if_allowed) cannot interleave with
/// other writers.
#[derive(Debug, Clone)]
pub struct SharedBudgetLedger {
    inner: Arc<RwLock<BudgetLedger>>,
}

impl SharedBudgetLedger {
    /// Create a new shared ledger.
    pub fn new(config: LedgerConfig) -> LedgerResult<Self> {
        Ok(Self::from_ledger(BudgetLedger::new(config)?))
    }

    /// Wrap an existing ledger.
    pub fn from_ledger(ledger: BudgetLedger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, BudgetLedger>> {
        self.inner.read().map_err(|_| LedgerError::LockPoisoned)
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, BudgetLedger>> {
        self.inner.write().map_err(|_| LedgerError::LockPoisoned)
    }

    /// Current usage snapshot.
    pub fn status(&self) -> LedgerResult<BudgetStatus> {
        Ok(self.read()?.status())
    }

    /// Weighted cost of `amount` raw tokens in `mode`.
    pub fn estimate_cost(&self, amount: u64, mode: ExecutionMode) -> LedgerResult<u64> {
        self.read()?.estimate_cost(amount, mode)
    }

    /// Check whether an operation fits.
    pub fn can_execute(&self, amount: u64, mode: ExecutionMode) -> LedgerResult<AdmissionDecision> {
        self.read()?.can_execute(amount, mode)
    }

    /// Charge an operation and return an identifier for it.
    pub fn reserve(&self, amount: u64, mode: ExecutionMode) -> LedgerResult<ReservationId> {
        self.write()?.reserve(amount, mode)
    }

    /// Charge an operation.
    pub fn consume(&self, amount: u64, mode: ExecutionMode) -> LedgerResult<()> {
        self.write()?.consume(amount, mode)
    }

    /// Admission check and reservation under a single write lock.
    pub fn reserve_if_allowed(
        &self,
        amount: u64,
        mode: ExecutionMode,
    ) -> LedgerResult<(AdmissionDecision, Option<ReservationId>)> {
        self.write()?.reserve_if_allowed(amount, mode)
    }

    /// Start a new budget period.
    pub fn reset(&self) -> LedgerResult<()> {
        self.write()?.reset();
        Ok(())
    }

    /// Get budget summary.
    pub fn summary(&self) -> LedgerResult<LedgerSummary> {
        Ok(self.read()?.summary())
    }

    /// Alerts recorded this period.
    pub fn alerts(&self) -> LedgerResult<Vec<Alert>> {
        Ok(self.read()?.alerts().to_vec())
    }
}
