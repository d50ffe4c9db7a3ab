//! Feature engineering pipeline: batch → aggregate pass → per-row features → aligned vectors.

use super::{
    align, finite_or_zero, FeatureTable, FeatureVector, TrainingSchema, CHANNEL_PREFIX,
    CURRENCY_PREFIX, NUMERIC_FEATURES,
};
use crate::ingest::Transaction;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Moments {
    mean: f64,
    std: f64,
}

impl Moments {
    /// `ddof` 1 for sample, 0 for population deviation. Undefined std is NaN.
    fn of(values: &[f64], ddof: usize) -> Self {
        let n = values.len();
        if n == 0 {
            return Self {
                mean: f64::NAN,
                std: f64::NAN,
            };
        }
        let mean = values.iter().sum::<f64>() / n as f64;
        let std = if n > ddof {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - ddof) as f64).sqrt()
        } else {
            f64::NAN
        };
        Self { mean, std }
    }

    /// Zero when the deviation is undefined or (numerically) zero.
    fn z(&self, value: f64) -> f64 {
        let tolerance = f64::EPSILON * self.mean.abs().max(1.0) * 16.0;
        if !self.std.is_finite() || self.std <= tolerance {
            return 0.0;
        }
        finite_or_zero((value - self.mean) / self.std)
    }
}

fn count_by<'a>(keys: impl Iterator<Item = &'a str>) -> HashMap<String, usize> {
    let mut out: HashMap<String, usize> = HashMap::new();
    for k in keys {
        *out.entry(k.to_string()).or_default() += 1;
    }
    out
}

/// Batch-relative lookups, computed once before any row is featurized and
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct BatchStats {
    len: usize,
    debtor_counts: HashMap<String, usize>,
    creditor_freq: HashMap<String, usize>,
    currency_freq: HashMap<String, usize>,
    channel_freq: HashMap<String, usize>,
    country_currency_freq: HashMap<(String, String), usize>,
    amount: Moments,
    peer_groups: HashMap<(String, String), Moments>,
}

impl BatchStats {
    pub fn compute(transactions: &[Transaction]) -> Self {
        let mut country_currency_freq: HashMap<(String, String), usize> = HashMap::new();
        for t in transactions {
            if let Some(country) = &t.country {
                *country_currency_freq
                    .entry((country.clone(), t.currency.clone()))
                    .or_default() += 1;
            }
        }

        let mut peer_amounts: HashMap<(String, String), Vec<f64>> = HashMap::new();
        for t in transactions {
            peer_amounts
                .entry((t.channel.clone(), t.currency.clone()))
                .or_default()
                .push(t.amount);
        }
        let peer_groups = peer_amounts
            .into_iter()
            .map(|(k, amounts)| (k, Moments::of(&amounts, 0)))
            .collect();

        let amounts: Vec<f64> = transactions.iter().map(|t| t.amount).collect();

        Self {
            len: transactions.len(),
            debtor_counts: count_by(transactions.iter().map(|t| t.debtor_id.as_str())),
            creditor_freq: count_by(transactions.iter().map(|t| t.creditor_account.as_str())),
            currency_freq: count_by(transactions.iter().map(|t| t.currency.as_str())),
            channel_freq: count_by(transactions.iter().map(|t| t.channel.as_str())),
            country_currency_freq,
            amount: Moments::of(&amounts, 1),
            peer_groups,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn debtor_txn_count(&self, debtor_id: &str) -> usize {
        self.debtor_counts.get(debtor_id).copied().unwrap_or(0)
    }

    pub fn creditor_freq(&self, account: &str) -> usize {
        self.creditor_freq.get(account).copied().unwrap_or(0)
    }

    pub fn currency_freq(&self, currency: &str) -> usize {
        self.currency_freq.get(currency).copied().unwrap_or(0)
    }

    pub fn channel_freq(&self, channel: &str) -> usize {
        self.channel_freq.get(channel).copied().unwrap_or(0)
    }

    /// 0 when the row carries no country.
    pub fn country_currency_freq(&self, country: Option<&str>, currency: &str) -> usize {
        country
            .and_then(|c| {
                self.country_currency_freq
                    .get(&(c.to_string(), currency.to_string()))
                    .copied()
            })
            .unwrap_or(0)
    }

    /// Amount z-score against the whole batch (sample std).
    pub fn global_z(&self, amount: f64) -> f64 {
        self.amount.z(amount)
    }

    /// Amount z-score inside the (channel, currency) peer group (population std).
    pub fn peer_z(&self, channel: &str, currency: &str, amount: f64) -> f64 {
        self.peer_groups
            .get(&(channel.to_string(), currency.to_string()))
            .map_or(0.0, |m| m.z(amount))
    }
}

/// Population-level features for one transaction, before categorical encoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineeredFeatures {
    pub txn_id: String,
    pub log_amount: f64,
    pub hour: u32,
    pub debtor_txn_count: usize,
    pub creditor_freq: usize,
    pub currency_freq: usize,
    pub channel_freq: usize,
    pub country_currency_freq: usize,
    pub global_z_amt: f64,
    pub chan_cur_z_amt: f64,
}

impl EngineeredFeatures {
    pub fn derive(t: &Transaction, stats: &BatchStats) -> Self {
        Self {
            txn_id: t.txn_id.clone(),
            log_amount: t.amount.ln_1p(),
            hour: t.hour(),
            debtor_txn_count: stats.debtor_txn_count(&t.debtor_id),
            creditor_freq: stats.creditor_freq(&t.creditor_account),
            currency_freq: stats.currency_freq(&t.currency),
            channel_freq: stats.channel_freq(&t.channel),
            country_currency_freq: stats.country_currency_freq(t.country.as_deref(), &t.currency),
            global_z_amt: stats.global_z(t.amount),
            chan_cur_z_amt: stats.peer_z(&t.channel, &t.currency, t.amount),
        }
    }

    /// Values in `NUMERIC_FEATURES` order.
    pub fn numeric_values(&self) -> [f64; NUMERIC_FEATURES.len()] {
        [
            self.log_amount,
            self.hour as f64,
            self.debtor_txn_count as f64,
            self.creditor_freq as f64,
            self.currency_freq as f64,
            self.channel_freq as f64,
            self.country_currency_freq as f64,
            self.global_z_amt,
            self.chan_cur_z_amt,
        ]
    }
}

/// Everything the scoring stage needs from one batch.
#[derive(Debug, Clone)]
pub struct EncodedBatch {
    pub stats: BatchStats,
    pub features: Vec<EngineeredFeatures>,
    pub vectors: Vec<FeatureVector>,
}

/// Derives the global model's input. The categorical vocabulary comes from the
/// training schema, so a batch can never add or remove indicator columns.
pub struct FeatureEngineer {
    schema: TrainingSchema,
    currencies: Vec<String>,
    channels: Vec<String>,
}

impl FeatureEngineer {
    pub fn new(schema: TrainingSchema) -> Self {
        let currencies = schema.vocabulary(CURRENCY_PREFIX);
        let channels = schema.vocabulary(CHANNEL_PREFIX);
        Self {
            schema,
            currencies,
            channels,
        }
    }

    pub fn schema(&self) -> &TrainingSchema {
        &self.schema
    }

    pub fn engineer(&self, transactions: &[Transaction], stats: &BatchStats) -> Vec<EngineeredFeatures> {
        transactions
            .iter()
            .map(|t| EngineeredFeatures::derive(t, stats))
            .collect()
    }

    /// Engineered table: numeric features plus one indicator per known category.
    pub fn table(&self, transactions: &[Transaction], features: &[EngineeredFeatures]) -> FeatureTable {
        let mut columns: Vec<String> = NUMERIC_FEATURES.iter().map(|c| c.to_string()).collect();
        columns.extend(self.currencies.iter().map(|c| format!("{}{}", CURRENCY_PREFIX, c)));
        columns.extend(self.channels.iter().map(|c| format!("{}{}", CHANNEL_PREFIX, c)));

        let mut table = FeatureTable::new(columns);
        for (t, f) in transactions.iter().zip(features) {
            let mut row: Vec<f64> = f.numeric_values().to_vec();
            row.extend(self.currencies.iter().map(|c| indicator(c == &t.currency)));
            row.extend(self.channels.iter().map(|c| indicator(c == &t.channel)));
            table.push_row(f.txn_id.clone(), row);
        }
        table
    }

    /// Aggregate pass, per-row derivation, then alignment onto the schema.
    pub fn encode(&self, transactions: &[Transaction]) -> EncodedBatch {
        let stats = BatchStats::compute(transactions);
        let features = self.engineer(transactions, &stats);
        let table = self.table(transactions, &features);
        let vectors = align(&table, &self.schema);
        tracing::debug!(
            rows = vectors.len(),
            engineered_columns = table.columns.len(),
            schema_columns = self.schema.len(),
            "encoded batch"
        );
        EncodedBatch {
            stats,
            features,
            vectors,
        }
    }
}

fn indicator(hit: bool) -> f64 {
    if hit {
        1.0
    } else {
        0.0
    }
}
