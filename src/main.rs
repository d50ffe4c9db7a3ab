//! Batch driver: score a transaction file with the configured artifacts, or
//! write a debtor profile cache from one.
//!
//! Usage:
//!   pay-anomaly score <transactions.csv>
//!   pay-anomaly profile <transactions.csv> <profiles.csv>

use pay_anomaly::{
    config::ScoringConfig,
    detector::AnomalyDetector,
    features::ProfileAggregator,
    ingest,
    logging::StructuredLogger,
    report,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn usage() -> BoxError {
    "usage: pay-anomaly score <transactions.csv> | pay-anomaly profile <transactions.csv> <profiles.csv>".into()
}

fn run_score(config: &ScoringConfig, input: &Path) -> Result<(), BoxError> {
    let detector = AnomalyDetector::from_config(config)?;
    let cached = AnomalyDetector::load_profiles(config)?;
    let transactions = ingest::read_transactions(File::open(input)?)?;
    info!(input = %input.display(), rows = transactions.len(), "batch loaded");

    let mut batch = detector.score_batch(transactions, cached.as_ref())?;
    if config.output.sort_by_score {
        batch.sort_by_global_score();
    }

    let out = BufWriter::new(File::create(&config.output.flagged_path)?);
    let written = report::write_scored(out, batch.flagged())?;
    info!(path = %config.output.flagged_path.display(), rows = written, "flagged rows written");

    if let Some(path) = &config.output.audit_log_path {
        let n = report::write_audit_log(BufWriter::new(File::create(path)?), &batch)?;
        info!(path = %path.display(), lines = n, "audit log written");
    }
    Ok(())
}

fn run_profile(config: &ScoringConfig, input: &Path, output: &Path) -> Result<(), BoxError> {
    let transactions = ingest::read_transactions(File::open(input)?)?;
    let profiles = ProfileAggregator::new(config.features.mobile_channel.clone()).aggregate(&transactions);
    ingest::write_profiles(BufWriter::new(File::create(output)?), &profiles)?;
    info!(output = %output.display(), debtors = profiles.len(), "debtor profiles written");
    Ok(())
}

fn main() -> Result<(), BoxError> {
    let config_path = std::env::var("PAY_ANOMALY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.json"));
    let config = ScoringConfig::load(&config_path)?;

    StructuredLogger::init(config.log.json, &config.log.level);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["score", input] => run_score(&config, Path::new(input)),
        ["profile", input, output] => run_profile(&config, Path::new(input), Path::new(output)),
        _ => Err(usage()),
    }
}
