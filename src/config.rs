//! Scoring configuration. Artifact paths point at outputs of the offline
//! training job; nothing here changes model behaviour.

use crate::error::{Result, ScoreError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// JSON array of global feature column names, in training order
    pub schema_path: PathBuf,
    /// Population-wide outlier model (.onnx or .json forest)
    pub global_model_path: PathBuf,
    /// Per-debtor behavioural outlier model
    pub debtor_model_path: PathBuf,
    /// Cached debtor profile table; profiles are derived from the batch when unset
    pub profiles_path: Option<PathBuf>,
    /// Feature engineering parameters
    pub features: FeaturesConfig,
    /// Explanation thresholds
    pub explain: ExplainConfig,
    /// Export surface
    pub output: OutputConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Channel value counted towards a debtor's `mobile_pct`
    pub mobile_channel: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainConfig {
    /// Currency/channel batch counts below this are called rare
    pub rare_count: usize,
    /// |z| above this is called a deviation
    pub z_threshold: f64,
    /// Separator between reasons in the `explain` column
    pub delimiter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Flagged rows CSV
    pub flagged_path: PathBuf,
    /// Optional ndjson audit trail of flagged verdicts
    pub audit_log_path: Option<PathBuf>,
    /// Order flagged rows by ascending global score (most anomalous first)
    pub sort_by_score: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            schema_path: PathBuf::from("feature_cols.json"),
            global_model_path: PathBuf::from("global_iforest.onnx"),
            debtor_model_path: PathBuf::from("debtor_iforest.onnx"),
            profiles_path: None,
            features: FeaturesConfig::default(),
            explain: ExplainConfig::default(),
            output: OutputConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            mobile_channel: "mobile".to_string(),
        }
    }
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            rare_count: 5,
            z_threshold: 3.0,
            delimiter: "; ".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            flagged_path: PathBuf::from("flagged.csv"),
            audit_log_path: None,
            sort_by_score: true,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl ScoringConfig {
    /// Load from JSON file if present; otherwise return default.
    /// A file that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        serde_json::from_str::<ScoringConfig>(&data)
            .map_err(|e| ScoreError::Config(format!("{}: {}", path.display(), e)))
    }
}
