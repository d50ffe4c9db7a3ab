//! Combines the global and behavioural classifications into one flag.

use super::Reason;
use crate::model::Classification;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalFlag {
    Normal,
    Anomaly,
}

impl FinalFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            FinalFlag::Normal => "NORMAL",
            FinalFlag::Anomaly => "ANOMALY",
        }
    }
}

impl fmt::Display for FinalFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transaction is flagged when either detector trips. No weighting.
pub fn combine(global: Classification, debtor: Classification) -> FinalFlag {
    if global.is_anomalous() || debtor.is_anomalous() {
        FinalFlag::Anomaly
    } else {
        FinalFlag::Normal
    }
}

/// Stateless handle for [`combine`], kept so the combination rule has a seam.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionCombiner;

impl DecisionCombiner {
    pub fn combine(&self, global: Classification, debtor: Classification) -> FinalFlag {
        combine(global, debtor)
    }
}

/// Final pipeline output for one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyVerdict {
    pub final_flag: FinalFlag,
    /// Empty means "No strong reasons"
    pub reasons: Vec<Reason>,
}

impl AnomalyVerdict {
    pub fn is_anomaly(&self) -> bool {
        self.final_flag == FinalFlag::Anomaly
    }

    /// Reasons in priority order joined by `delimiter`, or the sentinel.
    pub fn explain(&self, delimiter: &str) -> String {
        if self.reasons.is_empty() {
            return super::NO_STRONG_REASONS.to_string();
        }
        self.reasons
            .iter()
            .map(Reason::to_string)
            .collect::<Vec<_>>()
            .join(delimiter)
    }
}
