//! ONNX Runtime inference for outlier models exported from the training job.
//! Input: [1, n_features] f32. Outputs: `label` (int64, -1 outlier / 1 inlier)
//! and `scores` (float decision function).

use super::{check_width, Classification, OutlierModel, ScoreResult};
use crate::error::{Result, ScoreError};
use ndarray::Array2;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::Mutex;

const LABEL_OUTPUT: &str = "label";
const SCORES_OUTPUT: &str = "scores";

pub struct OnnxDetector {
    session: Mutex<Session>,
    name: String,
    scores_output: String,
    label_output: Option<String>,
    n_features: usize,
}

fn inference_err(e: impl std::fmt::Display) -> ScoreError {
    ScoreError::Inference(e.to_string())
}

fn artifact_err(path: &Path, e: impl std::fmt::Display) -> ScoreError {
    ScoreError::Artifact {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

impl OnnxDetector {
    /// Load model from path. A missing or unreadable artifact is fatal: scoring
    /// without the model would silently pass every transaction.
    pub fn load(path: &Path, n_features: usize) -> Result<Self> {
        if !path.exists() {
            return Err(ScoreError::Artifact {
                path: path.to_path_buf(),
                reason: "file not found".into(),
            });
        }
        let session = Session::builder()
            .map_err(|e| artifact_err(path, e))?
            .commit_from_file(path)
            .map_err(|e| artifact_err(path, e))?;

        let outputs: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        let scores_output = outputs
            .iter()
            .find(|n| n.as_str() == SCORES_OUTPUT)
            .or_else(|| outputs.last())
            .cloned()
            .ok_or_else(|| ScoreError::Artifact {
                path: path.to_path_buf(),
                reason: "model defines no outputs".into(),
            })?;
        let label_output = outputs.iter().find(|n| n.as_str() == LABEL_OUTPUT).cloned();

        tracing::info!(
            path = %path.display(),
            n_features,
            scores = %scores_output,
            has_label = label_output.is_some(),
            "ONNX model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            name: path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("onnx")
                .to_string(),
            scores_output,
            label_output,
            n_features,
        })
    }

    fn run(&self, values: &[f64]) -> Result<ScoreResult> {
        check_width(&self.name, self.n_features, values)?;
        let row: Vec<f32> = values.iter().map(|v| *v as f32).collect();
        let arr = Array2::from_shape_vec((1, self.n_features), row).map_err(inference_err)?;
        let input = Value::from_array(arr).map_err(inference_err)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ScoreError::Inference("session lock poisoned".into()))?;
        let outputs = session.run(ort::inputs![input]).map_err(inference_err)?;

        let scores = outputs
            .get(self.scores_output.as_str())
            .ok_or_else(|| inference_err(format!("missing output `{}`", self.scores_output)))?;
        let (_, data) = scores.try_extract_tensor::<f32>().map_err(inference_err)?;
        let score = data
            .first()
            .copied()
            .map(f64::from)
            .ok_or_else(|| inference_err("empty scores tensor"))?;

        let classification = match &self.label_output {
            Some(name) => {
                let labels = outputs
                    .get(name.as_str())
                    .ok_or_else(|| inference_err(format!("missing output `{}`", name)))?;
                let (_, data) = labels.try_extract_tensor::<i64>().map_err(inference_err)?;
                data.first()
                    .copied()
                    .map(Classification::from_label)
                    .ok_or_else(|| inference_err("empty label tensor"))?
            }
            None => Classification::from_score(score),
        };

        Ok(ScoreResult {
            score,
            classification,
        })
    }
}

impl OutlierModel for OnnxDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn score(&self, values: &[f64]) -> Result<f64> {
        Ok(self.run(values)?.score)
    }

    fn classify(&self, values: &[f64]) -> Result<Classification> {
        Ok(self.run(values)?.classification)
    }

    fn evaluate(&self, values: &[f64]) -> Result<ScoreResult> {
        self.run(values)
    }
}
