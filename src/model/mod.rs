//! Pre-trained outlier models behind a `score`/`classify` contract, and the
//! scorers that guard their input layout.

mod forest;
mod onnx;

pub use forest::{IsolationForest, IsolationTree, Node};
pub use onnx::OnnxDetector;

use crate::error::{Result, ScoreError};
use crate::features::{FeatureVector, TrainingSchema, DEBTOR_FEATURES};
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

/// Binary model decision. Exported as the -1/1 label convention of the training job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Normal,
    Anomalous,
}

impl Classification {
    pub fn is_anomalous(self) -> bool {
        self == Classification::Anomalous
    }

    /// Decision-function convention: negative scores are outliers.
    pub fn from_score(score: f64) -> Self {
        if score < 0.0 {
            Classification::Anomalous
        } else {
            Classification::Normal
        }
    }

    pub fn from_label(label: i64) -> Self {
        if label < 0 {
            Classification::Anomalous
        } else {
            Classification::Normal
        }
    }

    pub fn label(self) -> i8 {
        match self {
            Classification::Normal => 1,
            Classification::Anomalous => -1,
        }
    }
}

/// One model's verdict on one row. Lower scores are more anomalous.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: f64,
    pub classification: Classification,
}

/// A fitted unsupervised outlier model. Inputs are already laid out in the
/// model's training order; implementations only check width.
pub trait OutlierModel: Send + Sync {
    fn name(&self) -> &str;

    fn n_features(&self) -> usize;

    /// Column names embedded in the artifact, when it carries them.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Higher = more normal.
    fn score(&self, values: &[f64]) -> Result<f64>;

    fn classify(&self, values: &[f64]) -> Result<Classification>;

    fn evaluate(&self, values: &[f64]) -> Result<ScoreResult> {
        Ok(ScoreResult {
            score: self.score(values)?,
            classification: self.classify(values)?,
        })
    }
}

/// Load an artifact, choosing the backend by file extension.
pub fn load_model(path: &Path, n_features: usize) -> Result<Box<dyn OutlierModel>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("onnx") => Ok(Box::new(OnnxDetector::load(path, n_features)?)),
        Some("json") => Ok(Box::new(IsolationForest::load(path)?)),
        _ => Err(ScoreError::Artifact {
            path: path.to_path_buf(),
            reason: "unsupported model format (expected .onnx or .json)".into(),
        }),
    }
}

pub(crate) fn check_width(model: &str, expected: usize, values: &[f64]) -> Result<()> {
    if values.len() != expected {
        return Err(ScoreError::FeatureWidth {
            model: model.to_string(),
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}

/// Binds a model to the exact column list it was trained on. Any vector whose
/// columns differ in count or order is rejected before reaching the model.
pub struct Scorer {
    label: &'static str,
    model: Box<dyn OutlierModel>,
    columns: Arc<[String]>,
}

impl Scorer {
    pub fn new(label: &'static str, model: Box<dyn OutlierModel>, columns: Arc<[String]>) -> Result<Self> {
        if model.n_features() != columns.len() {
            return Err(ScoreError::FeatureWidth {
                model: label.to_string(),
                expected: columns.len(),
                actual: model.n_features(),
            });
        }
        if let Some(names) = model.feature_names() {
            check_order(label, &columns, names)?;
        }
        tracing::debug!(scorer = label, model = model.name(), features = columns.len(), "scorer ready");
        Ok(Self {
            label,
            model,
            columns,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn check(&self, features: &FeatureVector) -> Result<()> {
        check_width(self.label, self.columns.len(), &features.values)?;
        if features.columns.len() != self.columns.len() {
            return Err(ScoreError::FeatureWidth {
                model: self.label.to_string(),
                expected: self.columns.len(),
                actual: features.columns.len(),
            });
        }
        if !Arc::ptr_eq(&features.columns, &self.columns) {
            check_order(self.label, &self.columns, &features.columns)?;
        }
        Ok(())
    }

    pub fn score(&self, features: &FeatureVector) -> Result<f64> {
        self.check(features)?;
        self.model.score(&features.values)
    }

    pub fn classify(&self, features: &FeatureVector) -> Result<Classification> {
        self.check(features)?;
        self.model.classify(&features.values)
    }

    pub fn evaluate(&self, features: &FeatureVector) -> Result<ScoreResult> {
        self.check(features)?;
        self.model.evaluate(&features.values)
    }
}

fn check_order(label: &str, expected: &[String], actual: &[String]) -> Result<()> {
    if expected.len() != actual.len() {
        return Err(ScoreError::FeatureWidth {
            model: label.to_string(),
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    for (position, (e, a)) in expected.iter().zip(actual).enumerate() {
        if e != a {
            return Err(ScoreError::FeatureOrder {
                model: label.to_string(),
                position,
                expected: e.clone(),
                actual: a.clone(),
            });
        }
    }
    Ok(())
}

/// Population model over the aligned global feature vector.
pub struct GlobalScorer(Scorer);

impl GlobalScorer {
    pub fn new(model: Box<dyn OutlierModel>, schema: &TrainingSchema) -> Result<Self> {
        Ok(Self(Scorer::new("global", model, Arc::clone(schema.columns()))?))
    }
}

impl Deref for GlobalScorer {
    type Target = Scorer;

    fn deref(&self) -> &Scorer {
        &self.0
    }
}

/// Behavioural model over `DEBTOR_FEATURES`.
pub struct DebtorScorer(Scorer);

impl DebtorScorer {
    pub fn new(model: Box<dyn OutlierModel>) -> Result<Self> {
        let columns: Arc<[String]> = DEBTOR_FEATURES.iter().map(|c| c.to_string()).collect();
        Ok(Self(Scorer::new("debtor", model, columns)?))
    }
}

impl Deref for DebtorScorer {
    type Target = Scorer;

    fn deref(&self) -> &Scorer {
        &self.0
    }
}
