//! End-to-end usage scenarios against a 10,000 token ledger.

use predicates::prelude::*;
use tokenledger::budget::{
    AdmissionDecision, AlertLevel, BudgetLedger, BudgetStatus, ExecutionMode, LedgerConfig,
    LedgerError, SharedBudgetLedger,
};

use crate::init_tracing;

fn ledger() -> BudgetLedger {
    init_tracing();
    BudgetLedger::new(LedgerConfig::new(10_000)).expect("valid config")
}

#[test]
fn fresh_ledger_reports_empty_status() {
    assert_eq!(
        ledger().status(),
        BudgetStatus {
            used: 0,
            remaining: 10_000,
            percentage: 0.0,
            alert_level: None,
        }
    );
}

#[test]
fn multi_agent_over_budget_falls_back_to_chat() {
    let decision = ledger().can_execute(5_000, ExecutionMode::MultiAgent).unwrap();
    assert_eq!(
        decision,
        AdmissionDecision {
            allowed: false,
            estimated_cost: 75_000,
            fallback: Some(ExecutionMode::Chat),
            reason: Some("Use chat mode".to_string()),
        }
    );
}

#[test]
fn oversized_chat_request_has_no_fallback() {
    // Fallback search ignores the requested mode; a chat request that does
    // not fit can never be rescued by a pricier mode.
    let mut ledger = ledger();
    ledger.consume(9_000, ExecutionMode::Chat).unwrap();
    let decision = ledger.can_execute(2_000, ExecutionMode::Chat).unwrap();
    assert_eq!(decision, AdmissionDecision::deny(2_000));
}

#[test]
fn reserve_then_consume_reaches_warning() {
    let mut ledger = ledger();

    ledger.reserve(1_000, ExecutionMode::SingleAgent).unwrap();
    assert_eq!(ledger.status().used, 4_000);

    ledger.consume(800, ExecutionMode::SingleAgent).unwrap();
    let status = ledger.status();
    assert_eq!(status.used, 7_200);
    assert!((status.percentage - 0.72).abs() < 1e-9);
    assert_eq!(status.alert_level, Some(AlertLevel::Warning));
}

#[test]
fn critical_and_overrun() {
    let mut ledger = ledger();

    ledger.consume(9_500, ExecutionMode::Chat).unwrap();
    assert_eq!(ledger.status().alert_level, Some(AlertLevel::Critical));

    ledger.consume(1_000, ExecutionMode::Chat).unwrap();
    let status = ledger.status();
    assert_eq!(status.used, 10_500);
    assert_eq!(status.percentage, 1.0);
    assert_eq!(status.remaining, 0);
    // Past the limit still reads as critical
    assert_eq!(status.alert_level, Some(AlertLevel::Critical));
}

#[test]
fn orchestrator_downgrade_loop() {
    let mut ledger = ledger();
    let requests = [
        (500, ExecutionMode::MultiAgent),
        (1_000, ExecutionMode::MultiAgent),
        (1_000, ExecutionMode::SingleAgent),
        (3_000, ExecutionMode::MultiAgent),
    ];

    let mut ran = Vec::new();
    for (amount, requested) in requests {
        let decision = ledger.can_execute(amount, requested).unwrap();
        if let Some(mode) = decision.effective_mode(requested) {
            ledger.reserve(amount, mode).unwrap();
            ran.push(mode);
        }
    }

    // Second and third requests are downgraded to chat; the last one does
    // not fit in any mode
    assert_eq!(ran, vec![ExecutionMode::MultiAgent, ExecutionMode::Chat, ExecutionMode::Chat]);
    assert_eq!(ledger.status().used, 9_500);
    assert_eq!(ledger.usage_for(ExecutionMode::Chat), 2_000);
}

#[test]
fn reset_starts_a_new_period() {
    let mut ledger = ledger();
    ledger.reserve(2_000, ExecutionMode::MultiAgent).unwrap();
    assert!(!ledger.alerts().is_empty());

    ledger.reset();

    assert_eq!(
        ledger.status(),
        BudgetStatus {
            used: 0,
            remaining: 10_000,
            percentage: 0.0,
            alert_level: None,
        }
    );
    assert!(ledger.alerts().is_empty());
    assert!(ledger.can_execute(600, ExecutionMode::MultiAgent).unwrap().allowed);
}

#[test]
fn strict_ledger_refuses_overrun() {
    init_tracing();
    let mut ledger = BudgetLedger::new(LedgerConfig::conservative(10_000)).unwrap();

    ledger.reserve(2_000, ExecutionMode::SingleAgent).unwrap();
    let err = ledger.consume(1_000, ExecutionMode::SingleAgent).unwrap_err();
    assert!(matches!(err, LedgerError::BudgetExceeded { .. }));
    assert_eq!(ledger.status().used, 8_000);
    // Conservative preset is already critical at 80%
    assert_eq!(ledger.status().alert_level, Some(AlertLevel::Critical));
}

#[test]
fn summary_reads_like_a_report() {
    let mut ledger = ledger();
    ledger.reserve(300, ExecutionMode::MultiAgent).unwrap();
    ledger.consume(2_800, ExecutionMode::Chat).unwrap();

    let text = ledger.summary().format();
    let report = predicate::str::contains("## Token Budget Summary")
        .and(predicate::str::contains("7300/10000"))
        .and(predicate::str::contains("[WARNING]"))
        .and(predicate::str::contains("**multi_agent**: 4500"))
        .and(predicate::str::contains("**Reservations**: 1"));
    assert!(report.eval(&text), "unexpected summary:\n{}", text);
}

#[test]
fn shared_ledger_matches_owned_ledger() {
    init_tracing();
    let shared = SharedBudgetLedger::new(LedgerConfig::new(10_000)).unwrap();
    let mut owned = ledger();

    for (amount, mode) in [
        (1_000, ExecutionMode::SingleAgent),
        (2_000, ExecutionMode::Chat),
        (100, ExecutionMode::MultiAgent),
    ] {
        shared.consume(amount, mode).unwrap();
        owned.consume(amount, mode).unwrap();
    }

    assert_eq!(shared.status().unwrap(), owned.status());
    assert_eq!(shared.alerts().unwrap().len(), owned.alerts().len());
    assert_eq!(
        shared.can_execute(100, ExecutionMode::MultiAgent).unwrap(),
        owned.can_execute(100, ExecutionMode::MultiAgent).unwrap()
    );
}
