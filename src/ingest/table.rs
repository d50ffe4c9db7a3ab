//! CSV readers/writers for the transaction batch and the debtor profile cache.

use super::{parse_timestamp, Transaction, REQUIRED_COLUMNS};
use crate::error::{Result, ScoreError};
use crate::features::{DebtorProfile, PROFILE_COLUMNS};
use serde::Deserialize;
use std::io::{Read, Write};

#[derive(Debug, Deserialize)]
struct RawTransaction {
    txn_id: String,
    debtor_id: String,
    amount: String,
    currency: String,
    channel: String,
    creditor_name: String,
    creditor_account: String,
    remittance_info: String,
    execution_time: Option<String>,
    timestamp: String,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl RawTransaction {
    fn into_transaction(self, row: usize) -> Result<Transaction> {
        let amount = self
            .amount
            .trim()
            .parse::<f64>()
            .map_err(|e| ScoreError::InvalidField {
                row,
                field: "amount",
                reason: e.to_string(),
            })?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(ScoreError::InvalidField {
                row,
                field: "amount",
                reason: format!("{} is not a non-negative number", self.amount),
            });
        }
        let timestamp = parse_timestamp(&self.timestamp).ok_or_else(|| ScoreError::InvalidField {
            row,
            field: "timestamp",
            reason: format!("cannot parse {:?} as a date-time", self.timestamp),
        })?;

        Ok(Transaction {
            txn_id: self.txn_id,
            debtor_id: self.debtor_id,
            amount,
            currency: self.currency,
            channel: self.channel,
            creditor_name: self.creditor_name,
            creditor_account: self.creditor_account,
            remittance_info: self.remittance_info,
            execution_time: non_empty(self.execution_time),
            timestamp,
            country: non_empty(self.country),
            injected_reason: non_empty(self.reason),
        })
    }
}

fn require_columns(
    headers: &csv::StringRecord,
    required: &[&str],
    table: &'static str,
) -> Result<()> {
    for column in required {
        if !headers.iter().any(|h| h.trim() == *column) {
            return Err(ScoreError::MissingColumn {
                table,
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Read a transaction batch. A missing required column or a row with an
/// unusable `amount`/`timestamp` fails the whole read; rows are numbered from 1.
pub fn read_transactions<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);
    let headers = rdr.headers()?.clone();
    require_columns(&headers, &REQUIRED_COLUMNS, "transaction")?;

    let mut out = Vec::new();
    for (i, record) in rdr.deserialize::<RawTransaction>().enumerate() {
        out.push(record?.into_transaction(i + 1)?);
    }
    tracing::debug!(rows = out.len(), "read transaction batch");
    Ok(out)
}

/// Read a precomputed debtor profile table.
pub fn read_profiles<R: Read>(reader: R) -> Result<Vec<DebtorProfile>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    require_columns(&headers, &PROFILE_COLUMNS, "debtor profile")?;

    let mut out = Vec::new();
    for record in rdr.deserialize::<DebtorProfile>() {
        out.push(record?);
    }
    Ok(out)
}

/// Write a profile table in the layout `read_profiles` accepts.
pub fn write_profiles<W: Write>(writer: W, profiles: &[DebtorProfile]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if profiles.is_empty() {
        wtr.write_record(PROFILE_COLUMNS)?;
    }
    for profile in profiles {
        wtr.serialize(profile)?;
    }
    wtr.flush()?;
    Ok(())
}
