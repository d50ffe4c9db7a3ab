//! Annotated batch output: scored rows, review ordering, summary.

mod export;

pub use export::{write_audit_log, write_scored, OUTPUT_COLUMNS};

use crate::features::EngineeredFeatures;
use crate::ingest::Transaction;
use crate::model::ScoreResult;
use crate::risk::AnomalyVerdict;
use serde::Serialize;
use uuid::Uuid;

/// Input row plus both model results, the verdict and its rendered explanation.
#[derive(Debug, Clone)]
pub struct ScoredTransaction {
    pub transaction: Transaction,
    pub features: EngineeredFeatures,
    pub global: ScoreResult,
    pub debtor: ScoreResult,
    pub verdict: AnomalyVerdict,
    pub explain: String,
    /// False when the debtor had no profile and was scored on zeros
    pub known_debtor: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub run_id: String,
    pub rows: usize,
    pub global_anomalies: usize,
    pub debtor_anomalies: usize,
    pub flagged: usize,
    pub unknown_debtors: usize,
}

/// One scored batch. Rows stay in input order until [`ScoredBatch::sort_by_global_score`].
#[derive(Debug, Clone)]
pub struct ScoredBatch {
    pub run_id: Uuid,
    pub schema_fingerprint: String,
    pub rows: Vec<ScoredTransaction>,
}

impl ScoredBatch {
    pub fn new(schema_fingerprint: String, rows: Vec<ScoredTransaction>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            schema_fingerprint,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Ascending global score, most anomalous first. Stable for ties.
    pub fn sort_by_global_score(&mut self) {
        self.rows
            .sort_by(|a, b| a.global.score.total_cmp(&b.global.score));
    }

    /// The export surface: rows whose final flag is ANOMALY.
    pub fn flagged(&self) -> impl Iterator<Item = &ScoredTransaction> {
        self.rows.iter().filter(|r| r.verdict.is_anomaly())
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            run_id: self.run_id.to_string(),
            rows: self.rows.len(),
            global_anomalies: self
                .rows
                .iter()
                .filter(|r| r.global.classification.is_anomalous())
                .count(),
            debtor_anomalies: self
                .rows
                .iter()
                .filter(|r| r.debtor.classification.is_anomalous())
                .count(),
            flagged: self.flagged().count(),
            unknown_debtors: self.rows.iter().filter(|r| !r.known_debtor).count(),
        }
    }
}
