//! Shared fixtures: transaction builder and rule-based stand-in models.

#![allow(dead_code)]

use chrono::NaiveDate;
use pay_anomaly::{Classification, OutlierModel, Result, Transaction};

pub fn txn(id: &str, debtor: &str, amount: f64, currency: &str, channel: &str) -> Transaction {
    Transaction {
        txn_id: id.to_string(),
        debtor_id: debtor.to_string(),
        amount,
        currency: currency.to_string(),
        channel: channel.to_string(),
        creditor_name: format!("Creditor {}", id),
        creditor_account: format!("GB00ACCT{}", id),
        remittance_info: "Payment".to_string(),
        execution_time: Some("10:30".to_string()),
        timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap(),
        country: Some("UK".to_string()),
        injected_reason: None,
    }
}

/// Scores with a plain function of the input row; negative means outlier.
pub struct RuleModel {
    pub n_features: usize,
    pub rule: fn(&[f64]) -> f64,
}

impl OutlierModel for RuleModel {
    fn name(&self) -> &str {
        "rule"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn score(&self, values: &[f64]) -> Result<f64> {
        Ok((self.rule)(values))
    }

    fn classify(&self, values: &[f64]) -> Result<Classification> {
        Ok(Classification::from_score(self.score(values)?))
    }
}

pub fn always_normal(n_features: usize) -> Box<dyn OutlierModel> {
    Box::new(RuleModel {
        n_features,
        rule: |_| 0.1,
    })
}
