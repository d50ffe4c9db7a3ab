//! Training-time column contract and the aligner that enforces it.

use super::{finite_or_zero, FeatureTable, FeatureVector, CHANNEL_PREFIX, CURRENCY_PREFIX, NUMERIC_FEATURES};
use crate::error::{Result, ScoreError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Ordered feature columns the global model was fitted on. Also the source of
/// the categorical vocabulary: only `cur_*`/`ch_*` columns listed here exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct TrainingSchema {
    columns: Arc<[String]>,
}

impl TryFrom<Vec<String>> for TrainingSchema {
    type Error = ScoreError;

    fn try_from(columns: Vec<String>) -> Result<Self> {
        TrainingSchema::new(columns)
    }
}

impl From<TrainingSchema> for Vec<String> {
    fn from(schema: TrainingSchema) -> Self {
        schema.columns.to_vec()
    }
}

impl TrainingSchema {
    pub fn new(columns: Vec<String>) -> Result<Self> {
        if columns.is_empty() {
            return Err(ScoreError::Schema("no columns".into()));
        }
        let mut seen = HashSet::new();
        for c in &columns {
            if !seen.insert(c.as_str()) {
                return Err(ScoreError::Schema(format!("duplicate column `{}`", c)));
            }
        }
        Ok(Self {
            columns: columns.into(),
        })
    }

    /// Numeric features followed by channel then currency indicators,
    /// the layout the offline feature job emits.
    pub fn standard(currencies: &[&str], channels: &[&str]) -> Result<Self> {
        let mut columns: Vec<String> = NUMERIC_FEATURES.iter().map(|c| c.to_string()).collect();
        columns.extend(channels.iter().map(|c| format!("{}{}", CHANNEL_PREFIX, c)));
        columns.extend(currencies.iter().map(|c| format!("{}{}", CURRENCY_PREFIX, c)));
        Self::new(columns)
    }

    /// Load a JSON array of column names.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let schema: TrainingSchema = serde_json::from_str(&data)?;
        Ok(schema)
    }

    pub fn columns(&self) -> &Arc<[String]> {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Category values captured for an indicator prefix, in schema order.
    pub fn vocabulary(&self, prefix: &str) -> Vec<String> {
        self.columns
            .iter()
            .filter_map(|c| c.strip_prefix(prefix))
            .map(str::to_string)
            .collect()
    }

    /// SHA-256 over the ordered column list; identifies the contract in audit logs.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for c in self.columns.iter() {
            hasher.update(c.as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Reindex `table` onto `schema`: schema columns in schema order, absent
/// columns filled with 0, extra columns dropped, row order kept.
pub fn align(table: &FeatureTable, schema: &TrainingSchema) -> Vec<FeatureVector> {
    let sources: Vec<Option<usize>> = schema
        .columns()
        .iter()
        .map(|c| table.column_index(c))
        .collect();

    table
        .row_ids
        .iter()
        .zip(&table.rows)
        .map(|(id, row)| FeatureVector {
            txn_id: id.clone(),
            columns: Arc::clone(schema.columns()),
            values: sources
                .iter()
                .map(|src| src.and_then(|i| row.get(i).copied()).map_or(0.0, finite_or_zero))
                .collect(),
        })
        .collect()
}
