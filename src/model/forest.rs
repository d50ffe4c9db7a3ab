//! Isolation forest exported as JSON and scored natively.
//!
//! Scores follow the decision-function convention of the training library:
//! `score = -2^(-E[h(x)] / c(max_samples)) - offset`, outliers below zero.

use super::{check_width, Classification, OutlierModel};
use crate::error::{Result, ScoreError};
use serde::{Deserialize, Serialize};
use std::path::Path;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// `x[feature] <= threshold` goes left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        n_samples: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationTree {
    /// Root at index 0; children always follow their parent
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    pub n_features: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    pub max_samples: usize,
    pub offset: f64,
    pub trees: Vec<IsolationTree>,
}

/// Expected path length of an unsuccessful BST search over `n` points.
pub(crate) fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

impl IsolationTree {
    fn path_length(&self, values: &[f64]) -> f64 {
        let mut idx = 0;
        let mut depth = 0.0;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if values[*feature] <= *threshold { *left } else { *right };
                    depth += 1.0;
                }
                Node::Leaf { n_samples } => return depth + average_path_length(*n_samples),
            }
        }
    }
}

impl IsolationForest {
    pub fn from_json(data: &str) -> std::result::Result<Self, String> {
        let forest: IsolationForest = serde_json::from_str(data).map_err(|e| e.to_string())?;
        forest.validate()?;
        Ok(forest)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let forest = Self::from_json(&data).map_err(|reason| ScoreError::Artifact {
            path: path.to_path_buf(),
            reason,
        })?;
        tracing::info!(
            path = %path.display(),
            trees = forest.trees.len(),
            features = forest.n_features,
            "isolation forest loaded"
        );
        Ok(forest)
    }

    /// Structural checks that make traversal total: in-range features and
    /// strictly forward child links (no cycles).
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".into());
        }
        if self.max_samples < 2 {
            return Err(format!("max_samples must be at least 2, got {}", self.max_samples));
        }
        if let Some(names) = &self.feature_names {
            if names.len() != self.n_features {
                return Err(format!(
                    "{} feature names for {} features",
                    names.len(),
                    self.n_features
                ));
            }
        }
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(format!("tree {} is empty", t));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                if let Node::Split {
                    feature, left, right, ..
                } = node
                {
                    if *feature >= self.n_features {
                        return Err(format!("tree {} node {}: feature {} out of range", t, i, feature));
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= tree.nodes.len() {
                            return Err(format!("tree {} node {}: bad child link {}", t, i, child));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Raw anomaly measure in (-1, 0]; more negative is more isolated.
    pub fn score_samples(&self, values: &[f64]) -> f64 {
        let mean_depth = self
            .trees
            .iter()
            .map(|t| t.path_length(values))
            .sum::<f64>()
            / self.trees.len() as f64;
        -(2f64).powf(-mean_depth / average_path_length(self.max_samples))
    }
}

impl OutlierModel for IsolationForest {
    fn name(&self) -> &str {
        "isolation_forest"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn score(&self, values: &[f64]) -> Result<f64> {
        check_width(self.name(), self.n_features, values)?;
        Ok(self.score_samples(values) - self.offset)
    }

    fn classify(&self, values: &[f64]) -> Result<Classification> {
        Ok(Classification::from_score(self.score(values)?))
    }
}
