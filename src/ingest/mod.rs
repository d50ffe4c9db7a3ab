//! Payment records as read from the batch input table.

mod table;

pub use table::{read_profiles, read_transactions, write_profiles};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Columns the transaction table must carry. `country` and `reason` are optional.
pub const REQUIRED_COLUMNS: [&str; 10] = [
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
];

/// A single payment instruction. Never mutated after ingestion; features are
/// derived into separate records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub txn_id: String,
    pub debtor_id: String,
    pub amount: f64,
    pub currency: String,
    pub channel: String,
    pub creditor_name: String,
    pub creditor_account: String,
    pub remittance_info: String,
    /// Wall-clock `HH:MM`; kept raw because a malformed value is not fatal
    pub execution_time: Option<String>,
    pub timestamp: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Ground-truth label from synthetic data. Audit aid only, never a model input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injected_reason: Option<String>,
}

impl Transaction {
    /// Hour of day from `execution_time`. Missing or malformed values fall back to noon.
    pub fn hour(&self) -> u32 {
        self.execution_time
            .as_deref()
            .and_then(parse_hour)
            .unwrap_or(DEFAULT_HOUR)
    }
}

pub const DEFAULT_HOUR: u32 = 12;

fn parse_hour(raw: &str) -> Option<u32> {
    let head = raw.split(':').next()?.trim();
    let hour = head.parse::<u32>().ok()?;
    (hour < 24).then_some(hour)
}

const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Accepts ISO-8601 with or without offset, or a bare date (midnight).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
