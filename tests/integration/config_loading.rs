//! Loading ledger configuration from files.

use std::fs;

use tempfile::TempDir;
use tokenledger::budget::{BudgetLedger, ExecutionMode, LedgerConfig, LedgerError};

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("ledger.toml");
    fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
default_budget = 50000
warning_threshold = 0.6
critical_threshold = 0.85
enable_auto_fallback = false
enforce_limit = true

[cost_table]
multi_agent = 10
"#,
    );

    let config = LedgerConfig::load(&path).unwrap();
    assert_eq!(config.default_budget, 50_000);
    assert_eq!(config.warning_threshold, 0.6);
    assert_eq!(config.critical_threshold, 0.85);
    assert!(!config.enable_auto_fallback);
    assert!(config.enforce_limit);
    assert_eq!(config.cost_table.multi_agent, 10);
    assert_eq!(config.cost_table.single_agent, 4);

    let ledger = BudgetLedger::new(config).unwrap();
    assert_eq!(ledger.estimate_cost(100, ExecutionMode::MultiAgent).unwrap(), 1_000);
}

#[test]
fn load_applies_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "default_budget = 10000\n");

    let config = LedgerConfig::load(&path).unwrap();
    assert_eq!(config, LedgerConfig::new(10_000));
}

#[test]
fn load_rejects_invalid_thresholds() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "default_budget = 10000\nwarning_threshold = 0.95\ncritical_threshold = 0.9\n",
    );

    assert!(matches!(
        LedgerConfig::load(&path),
        Err(LedgerError::InvertedThresholds { .. })
    ));
}

#[test]
fn load_accepts_camel_case_keys() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
defaultBudget = 10000
warningThreshold = 0.5
criticalThreshold = 0.8
enableAutoFallback = false

[costTable]
multi_agent = 12
"#,
    );

    let config = LedgerConfig::load(&path).unwrap();
    assert_eq!(config.default_budget, 10_000);
    assert_eq!(config.warning_threshold, 0.5);
    assert_eq!(config.critical_threshold, 0.8);
    assert!(!config.enable_auto_fallback);
    assert_eq!(config.cost_table.multi_agent, 12);

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(LedgerConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn load_rejects_unordered_cost_table() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "default_budget = 10000\n\n[cost_table]\nchat = 50\nsingle_agent = 4\nmulti_agent = 1\n",
    );

    assert!(matches!(
        LedgerConfig::load(&path),
        Err(LedgerError::InvalidCostTable(_))
    ));
}

#[test]
fn load_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = LedgerConfig::load(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(LedgerError::Io(_))));
}

#[test]
fn toml_round_trip_through_ledger() {
    let original = LedgerConfig::relaxed(30_000).with_enforce_limit(true);
    let text = toml::to_string(&original).unwrap();
    let parsed = LedgerConfig::from_toml_str(&text).unwrap();
    assert_eq!(parsed, original);
}
