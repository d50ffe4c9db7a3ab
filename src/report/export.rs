//! Output table (CSV) and ndjson audit trail.

use super::{ScoredBatch, ScoredTransaction};
use crate::error::Result;
use crate::logging::{StructuredLogger, VerdictLine};
use chrono::Utc;
use std::io::Write;

pub const OUTPUT_COLUMNS: [&str; 18] = [
    "txn_id",
    "debtor_id",
    "amount",
    "currency",
    "channel",
    "creditor_name",
    "creditor_account",
    "remittance_info",
    "execution_time",
    "timestamp",
    "country",
    "reason",
    "global_score",
    "global_flag",
    "debtor_score",
    "debtor_flag",
    "final_flag",
    "explain",
];

fn record(row: &ScoredTransaction) -> [String; OUTPUT_COLUMNS.len()] {
    let t = &row.transaction;
    [
        t.txn_id.clone(),
        t.debtor_id.clone(),
        t.amount.to_string(),
        t.currency.clone(),
        t.channel.clone(),
        t.creditor_name.clone(),
        t.creditor_account.clone(),
        t.remittance_info.clone(),
        t.execution_time.clone().unwrap_or_default(),
        t.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
        t.country.clone().unwrap_or_default(),
        t.injected_reason.clone().unwrap_or_default(),
        row.global.score.to_string(),
        row.global.classification.label().to_string(),
        row.debtor.score.to_string(),
        row.debtor.classification.label().to_string(),
        row.verdict.final_flag.to_string(),
        row.explain.clone(),
    ]
}

/// Write rows with the input columns plus score/flag/explain columns.
/// Returns the number of data rows written.
pub fn write_scored<'a, W: Write>(
    writer: W,
    rows: impl IntoIterator<Item = &'a ScoredTransaction>,
) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(OUTPUT_COLUMNS)?;
    let mut n = 0;
    for row in rows {
        wtr.write_record(record(row))?;
        n += 1;
    }
    wtr.flush()?;
    Ok(n)
}

/// One JSON line per flagged verdict, tagged with run id and schema fingerprint.
pub fn write_audit_log<W: Write>(mut writer: W, batch: &ScoredBatch) -> Result<usize> {
    let run_id = batch.run_id.to_string();
    let ts = Utc::now().to_rfc3339();
    let mut n = 0;
    for row in batch.flagged() {
        let t = &row.transaction;
        let line = VerdictLine {
            ts: ts.clone(),
            run_id: &run_id,
            schema: &batch.schema_fingerprint,
            txn_id: &t.txn_id,
            debtor_id: &t.debtor_id,
            amount: t.amount,
            global_score: row.global.score,
            global_flag: row.global.classification.label(),
            debtor_score: row.debtor.score,
            debtor_flag: row.debtor.classification.label(),
            final_flag: row.verdict.final_flag.as_str(),
            explain: &row.explain,
            injected_reason: t.injected_reason.as_deref(),
        };
        StructuredLogger::emit_json(&line, &mut writer)?;
        n += 1;
    }
    writer.flush()?;
    Ok(n)
}
