//! Batch scoring: aggregate pass, then independent per-row scoring,
//! combination and explanation.

use crate::config::{ExplainConfig, FeaturesConfig, ScoringConfig};
use crate::error::Result;
use crate::features::{FeatureEngineer, ProfileAggregator, ProfileTable, TrainingSchema, DEBTOR_FEATURES};
use crate::ingest::{self, Transaction};
use crate::model::{load_model, DebtorScorer, GlobalScorer, OutlierModel};
use crate::report::{ScoredBatch, ScoredTransaction};
use crate::risk::{AnomalyVerdict, DecisionCombiner, ExplainContext, ExplanationGenerator};
use std::fs::File;
use tracing::info;

pub struct AnomalyDetector {
    engineer: FeatureEngineer,
    aggregator: ProfileAggregator,
    global: GlobalScorer,
    debtor: DebtorScorer,
    combiner: DecisionCombiner,
    explainer: ExplanationGenerator,
    delimiter: String,
}

impl AnomalyDetector {
    pub fn new(
        schema: TrainingSchema,
        global_model: Box<dyn OutlierModel>,
        debtor_model: Box<dyn OutlierModel>,
        features: &FeaturesConfig,
        explain: &ExplainConfig,
    ) -> Result<Self> {
        let global = GlobalScorer::new(global_model, &schema)?;
        let debtor = DebtorScorer::new(debtor_model)?;
        Ok(Self {
            engineer: FeatureEngineer::new(schema),
            aggregator: ProfileAggregator::new(features.mobile_channel.clone()),
            global,
            debtor,
            combiner: DecisionCombiner,
            explainer: ExplanationGenerator::new(explain),
            delimiter: explain.delimiter.clone(),
        })
    }

    /// Load the training schema and both model artifacts named in `config`.
    pub fn from_config(config: &ScoringConfig) -> Result<Self> {
        let schema = TrainingSchema::load(&config.schema_path)?;
        info!(
            path = %config.schema_path.display(),
            columns = schema.len(),
            fingerprint = %schema.fingerprint(),
            "training schema loaded"
        );
        let global_model = load_model(&config.global_model_path, schema.len())?;
        let debtor_model = load_model(&config.debtor_model_path, DEBTOR_FEATURES.len())?;
        Self::new(schema, global_model, debtor_model, &config.features, &config.explain)
    }

    /// Cached profile table from `config.profiles_path`, if configured.
    pub fn load_profiles(config: &ScoringConfig) -> Result<Option<ProfileTable>> {
        let Some(path) = &config.profiles_path else {
            return Ok(None);
        };
        let profiles = ingest::read_profiles(File::open(path)?)?;
        info!(path = %path.display(), debtors = profiles.len(), "debtor profiles loaded");
        Ok(Some(ProfileTable::new(profiles)))
    }

    pub fn schema(&self) -> &TrainingSchema {
        self.engineer.schema()
    }

    pub fn aggregator(&self) -> &ProfileAggregator {
        &self.aggregator
    }

    /// Score a batch. Without `cached` profiles they are aggregated from the
    /// batch itself. Output rows keep input order.
    pub fn score_batch(
        &self,
        transactions: Vec<Transaction>,
        cached: Option<&ProfileTable>,
    ) -> Result<ScoredBatch> {
        let encoded = self.engineer.encode(&transactions);
        let derived;
        let profiles = match cached {
            Some(p) => p,
            None => {
                derived = ProfileTable::new(self.aggregator.aggregate(&transactions));
                &derived
            }
        };

        let mut rows = Vec::with_capacity(transactions.len());
        for ((t, features), vector) in transactions
            .into_iter()
            .zip(encoded.features)
            .zip(&encoded.vectors)
        {
            let global = self.global.evaluate(vector)?;
            let debtor = self.debtor.evaluate(&profiles.features_for(&t))?;
            let profile = profiles.get(&t.debtor_id);

            let reasons = self.explainer.reasons(&ExplainContext {
                transaction: &t,
                features: &features,
                global: global.classification,
                debtor: debtor.classification,
                profile,
            });
            let verdict = AnomalyVerdict {
                final_flag: self
                    .combiner
                    .combine(global.classification, debtor.classification),
                reasons,
            };
            let explain = verdict.explain(&self.delimiter);
            let known_debtor = profile.is_some();

            rows.push(ScoredTransaction {
                transaction: t,
                features,
                global,
                debtor,
                verdict,
                explain,
                known_debtor,
            });
        }

        let batch = ScoredBatch::new(self.schema().fingerprint(), rows);
        let summary = batch.summary();
        info!(
            run_id = %summary.run_id,
            rows = summary.rows,
            global_anomalies = summary.global_anomalies,
            debtor_anomalies = summary.debtor_anomalies,
            flagged = summary.flagged,
            unknown_debtors = summary.unknown_debtors,
            "batch scored"
        );
        Ok(batch)
    }
}
