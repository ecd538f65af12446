//! Alert levels and the alert log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How close consumption is to the budget limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    /// Over the warning threshold
    Warning,
    /// Over the critical threshold
    Critical,
    /// Over the limit.
    ///
    /// Threshold evaluation never yields this level: any ratio at or above
    /// the critical threshold, including ratios above 1, reports
    /// [`AlertLevel::Critical`].
    Exceeded,
}

impl AlertLevel {
    /// Classify a usage ratio against the thresholds.
    ///
    /// `ratio` is the unclamped `used / limit`.
    pub fn evaluate(ratio: f64, warning_threshold: f64, critical_threshold: f64) -> Option<Self> {
        if ratio >= critical_threshold {
            Some(AlertLevel::Critical)
        } else if ratio >= warning_threshold {
            Some(AlertLevel::Warning)
        } else {
            None
        }
    }

    /// Uppercase label for display.
    pub fn label(&self) -> &'static str {
        match self {
            AlertLevel::Warning => "WARNING",
            AlertLevel::Critical => "CRITICAL",
            AlertLevel::Exceeded => "EXCEEDED",
        }
    }
}

/// A recorded change in alert level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    /// Tokens used when the alert fired
    pub used: u64,
    pub limit: u64,
    /// Unclamped `used / limit`
    pub ratio: f64,
    pub recorded_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(level: AlertLevel, used: u64, limit: u64) -> Self {
        Self {
            level,
            used,
            limit,
            ratio: used as f64 / limit as f64,
            recorded_at: Utc::now(),
        }
    }
}
