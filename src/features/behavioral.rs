//! Per-debtor behavioural profiles and the left join onto transactions.

use super::{finite_or_zero, FeatureVector, DEBTOR_FEATURES};
use crate::ingest::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtorProfile {
    pub debtor_id: String,
    pub txn_count: u64,
    pub avg_amt: f64,
    pub median_amt: f64,
    /// Sample standard deviation; 0 for a single transaction
    pub std_amt: f64,
    pub unique_payees: u64,
    pub mobile_pct: f64,
}

impl DebtorProfile {
    /// Behavioural model input in `DEBTOR_FEATURES` order, non-finite values zeroed.
    pub fn behavioural_values(&self) -> Vec<f64> {
        vec![
            self.txn_count as f64,
            finite_or_zero(self.avg_amt),
            finite_or_zero(self.std_amt),
            self.unique_payees as f64,
            finite_or_zero(self.mobile_pct),
        ]
    }
}

pub struct ProfileAggregator {
    mobile_channel: String,
}

impl ProfileAggregator {
    pub fn new(mobile_channel: impl Into<String>) -> Self {
        Self {
            mobile_channel: mobile_channel.into(),
        }
    }

    /// One profile per distinct debtor, ordered by `debtor_id`.
    pub fn aggregate(&self, transactions: &[Transaction]) -> Vec<DebtorProfile> {
        let mut groups: BTreeMap<&str, Vec<&Transaction>> = BTreeMap::new();
        for t in transactions {
            groups.entry(t.debtor_id.as_str()).or_default().push(t);
        }

        groups
            .into_iter()
            .map(|(debtor_id, txns)| self.profile(debtor_id, &txns))
            .collect()
    }

    fn profile(&self, debtor_id: &str, txns: &[&Transaction]) -> DebtorProfile {
        let n = txns.len();
        let mut amounts: Vec<f64> = txns.iter().map(|t| t.amount).collect();
        let avg = amounts.iter().sum::<f64>() / n as f64;
        let std = if n > 1 {
            let ss: f64 = amounts.iter().map(|a| (a - avg).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        } else {
            0.0
        };
        amounts.sort_by(f64::total_cmp);
        let median = if n % 2 == 1 {
            amounts[n / 2]
        } else {
            (amounts[n / 2 - 1] + amounts[n / 2]) / 2.0
        };
        let payees: HashSet<&str> = txns.iter().map(|t| t.creditor_account.as_str()).collect();
        let mobile = txns.iter().filter(|t| t.channel == self.mobile_channel).count();

        DebtorProfile {
            debtor_id: debtor_id.to_string(),
            txn_count: n as u64,
            avg_amt: finite_or_zero(avg),
            median_amt: finite_or_zero(median),
            std_amt: finite_or_zero(std),
            unique_payees: payees.len() as u64,
            mobile_pct: mobile as f64 / n as f64,
        }
    }
}

impl Default for ProfileAggregator {
    fn default() -> Self {
        Self::new("mobile")
    }
}

/// Profile snapshot keyed by debtor. Lookups for unknown debtors yield
/// all-zero behavioural features rather than an error.
pub struct ProfileTable {
    by_debtor: HashMap<String, DebtorProfile>,
    columns: Arc<[String]>,
}

impl ProfileTable {
    pub fn new(profiles: Vec<DebtorProfile>) -> Self {
        let mut by_debtor = HashMap::with_capacity(profiles.len());
        for p in profiles {
            if by_debtor.contains_key(&p.debtor_id) {
                tracing::warn!(debtor_id = %p.debtor_id, "duplicate debtor profile; keeping first");
                continue;
            }
            by_debtor.insert(p.debtor_id.clone(), p);
        }
        Self {
            by_debtor,
            columns: DEBTOR_FEATURES.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.by_debtor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_debtor.is_empty()
    }

    pub fn get(&self, debtor_id: &str) -> Option<&DebtorProfile> {
        self.by_debtor.get(debtor_id)
    }

    /// Behavioural model input for one transaction.
    pub fn features_for(&self, transaction: &Transaction) -> FeatureVector {
        let values = self
            .get(&transaction.debtor_id)
            .map(DebtorProfile::behavioural_values)
            .unwrap_or_else(|| vec![0.0; DEBTOR_FEATURES.len()]);
        FeatureVector {
            txn_id: transaction.txn_id.clone(),
            columns: Arc::clone(&self.columns),
            values,
        }
    }
}
