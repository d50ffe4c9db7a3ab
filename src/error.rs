//! Crate-wide error type. Data-quality issues never surface here; only
//! structural contract violations and I/O do.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{table} table is missing required column `{column}`")]
    MissingColumn { table: &'static str, column: String },

    #[error("row {row}: invalid `{field}`: {reason}")]
    InvalidField {
        row: usize,
        field: &'static str,
        reason: String,
    },

    #[error("{model}: expected {expected} features, got {actual}")]
    FeatureWidth {
        model: String,
        expected: usize,
        actual: usize,
    },

    #[error("{model}: feature {position} should be `{expected}`, got `{actual}`")]
    FeatureOrder {
        model: String,
        position: usize,
        expected: String,
        actual: String,
    },

    #[error("training schema: {0}")]
    Schema(String),

    #[error("model artifact {}: {reason}", path.display())]
    Artifact { path: PathBuf, reason: String },

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ScoreError>;
