//! Payment anomaly scoring — batch triage for human reviewers.
//!
//! Modular structure:
//! - [`ingest`] — Transaction records and CSV interchange
//! - [`features`] — Batch-relative features, debtor profiles, schema alignment
//! - [`model`] — Pre-trained outlier models (ONNX, JSON isolation forest)
//! - [`risk`] — Decision combination and explanations
//! - [`report`] — Scored output, ordering, export
//! - [`detector`] — End-to-end batch pipeline
//! - [`logging`] — Structured JSON logging

pub mod config;
pub mod detector;
pub mod error;
pub mod features;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod report;
pub mod risk;

pub use config::ScoringConfig;
pub use detector::AnomalyDetector;
pub use error::{Result, ScoreError};
pub use features::{DebtorProfile, FeatureEngineer, FeatureVector, ProfileAggregator, TrainingSchema};
pub use ingest::Transaction;
pub use logging::StructuredLogger;
pub use model::{Classification, OutlierModel, ScoreResult};
pub use report::{ScoredBatch, ScoredTransaction};
pub use risk::{AnomalyVerdict, FinalFlag, Reason};
