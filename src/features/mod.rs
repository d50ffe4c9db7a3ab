//! Feature extraction: batch-relative population features, debtor profiles,
//! and alignment onto the training-time column contract.

mod behavioral;
mod pipeline;
mod schema;

pub use behavioral::{DebtorProfile, ProfileAggregator, ProfileTable};
pub use pipeline::{BatchStats, EncodedBatch, EngineeredFeatures, FeatureEngineer};
pub use schema::{align, TrainingSchema};

use crate::error::Result;
use std::io::Write;
use std::sync::Arc;

/// Engineered numeric columns, in the order the training job lists them.
pub const NUMERIC_FEATURES: [&str; 9] = [
    "log_amount",
    "hour",
    "debtor_txn_count",
    "creditor_freq",
    "currency_freq",
    "channel_freq",
    "country_currency_freq",
    "global_z_amt",
    "chan_cur_z_amt",
];

/// Indicator column prefixes: `cur_GBP`, `ch_mobile`.
pub const CURRENCY_PREFIX: &str = "cur_";
pub const CHANNEL_PREFIX: &str = "ch_";

/// Input contract of the behavioural model. Order matters.
pub const DEBTOR_FEATURES: [&str; 5] = [
    "txn_count",
    "avg_amt",
    "std_amt",
    "unique_payees",
    "mobile_pct",
];

/// Columns of the debtor profile table.
pub const PROFILE_COLUMNS: [&str; 7] = [
    "debtor_id",
    "txn_count",
    "avg_amt",
    "median_amt",
    "std_amt",
    "unique_payees",
    "mobile_pct",
];

/// One model input row: named columns (shared across the batch) and values.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub txn_id: String,
    pub columns: Arc<[String]>,
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn dim(&self) -> usize {
        self.values.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i).copied())
    }
}

/// Pre-alignment feature table: whatever columns the engineer produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    pub columns: Vec<String>,
    pub row_ids: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            row_ids: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, id: impl Into<String>, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.columns.len());
        self.row_ids.push(id.into());
        self.rows.push(values);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Export as CSV with a leading `txn_id` column.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        let mut header = vec!["txn_id".to_string()];
        header.extend(self.columns.iter().cloned());
        wtr.write_record(&header)?;
        for (id, row) in self.row_ids.iter().zip(&self.rows) {
            let mut record = vec![id.clone()];
            record.extend(row.iter().map(|v| v.to_string()));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl From<&[FeatureVector]> for FeatureTable {
    fn from(vectors: &[FeatureVector]) -> Self {
        let columns = vectors
            .first()
            .map(|v| v.columns.to_vec())
            .unwrap_or_default();
        let mut table = FeatureTable::new(columns);
        for v in vectors {
            table.push_row(v.txn_id.clone(), v.values.clone());
        }
        table
    }
}

/// Replace NaN/inf with 0, the same fill the training job applies.
pub(crate) fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
