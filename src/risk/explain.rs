//! Reviewer-facing reasons. A pure function of one row's features, scores and
//! debtor profile; the emission order below is part of the output contract.

use crate::config::ExplainConfig;
use crate::features::{DebtorProfile, EngineeredFeatures};
use crate::ingest::Transaction;
use crate::model::Classification;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NO_STRONG_REASONS: &str = "No strong reasons";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reason {
    GlobalOutlier,
    RareCurrency { currency: String, count: usize },
    RareChannel { channel: String, count: usize },
    GlobalAmountDeviation { z: f64 },
    PeerGroupDeviation { channel: String, currency: String, z: f64 },
    BehaviouralAnomaly,
    DebtorAmountDeviation { z: f64 },
    /// Label carried by synthetic/audit data, not a model signal
    Injected { reason: String },
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::GlobalOutlier => write!(f, "Global model outlier"),
            Reason::RareCurrency { currency, .. } => write!(f, "Rare currency: {}", currency),
            Reason::RareChannel { channel, .. } => write!(f, "Rare channel: {}", channel),
            Reason::GlobalAmountDeviation { z } => write!(f, "Globally unusual amount (z={:.1})", z),
            Reason::PeerGroupDeviation {
                channel,
                currency,
                z,
            } => write!(f, "Unusual in {}/{} peer group (z={:.1})", channel, currency, z),
            Reason::BehaviouralAnomaly => write!(f, "Behavioural anomaly for debtor"),
            Reason::DebtorAmountDeviation { z } => write!(f, "Debtor amount deviation z={:.1}", z),
            Reason::Injected { reason } => write!(f, "Injected reason: {}", reason),
        }
    }
}

/// Amount deviation from the debtor's own history. A zero (or undefined)
/// `std_amt` is replaced by 1, so the denominator is never 0.
pub fn debtor_amount_z(amount: f64, profile: &DebtorProfile) -> f64 {
    let std = profile.std_amt;
    let denom = if std == 0.0 || !std.is_finite() { 1.0 } else { std };
    (amount - profile.avg_amt) / denom
}

/// Everything already computed for one row.
#[derive(Debug, Clone, Copy)]
pub struct ExplainContext<'a> {
    pub transaction: &'a Transaction,
    pub features: &'a EngineeredFeatures,
    pub global: Classification,
    pub debtor: Classification,
    /// `None` for a debtor with no profile: no debtor deviation is reported
    pub profile: Option<&'a DebtorProfile>,
}

#[derive(Debug, Clone)]
pub struct ExplanationGenerator {
    rare_count: usize,
    z_threshold: f64,
}

impl ExplanationGenerator {
    pub fn new(config: &ExplainConfig) -> Self {
        Self {
            rare_count: config.rare_count,
            z_threshold: config.z_threshold,
        }
    }

    /// Reasons in fixed priority: global (with its detail notes), behavioural,
    /// debtor amount deviation, injected label.
    pub fn reasons(&self, ctx: &ExplainContext<'_>) -> Vec<Reason> {
        let t = ctx.transaction;
        let f = ctx.features;
        let mut out = Vec::new();

        if ctx.global.is_anomalous() {
            out.push(Reason::GlobalOutlier);
            if f.currency_freq < self.rare_count {
                out.push(Reason::RareCurrency {
                    currency: t.currency.clone(),
                    count: f.currency_freq,
                });
            }
            if f.channel_freq < self.rare_count {
                out.push(Reason::RareChannel {
                    channel: t.channel.clone(),
                    count: f.channel_freq,
                });
            }
            if f.global_z_amt.abs() > self.z_threshold {
                out.push(Reason::GlobalAmountDeviation { z: f.global_z_amt });
            }
            if f.chan_cur_z_amt.abs() > self.z_threshold {
                out.push(Reason::PeerGroupDeviation {
                    channel: t.channel.clone(),
                    currency: t.currency.clone(),
                    z: f.chan_cur_z_amt,
                });
            }
        }

        if ctx.debtor.is_anomalous() {
            out.push(Reason::BehaviouralAnomaly);
        }

        if let Some(profile) = ctx.profile {
            let z = debtor_amount_z(t.amount, profile);
            if z.abs() > self.z_threshold {
                out.push(Reason::DebtorAmountDeviation { z });
            }
        }

        if let Some(reason) = t.injected_reason.as_deref().filter(|r| !r.is_empty()) {
            out.push(Reason::Injected {
                reason: reason.to_string(),
            });
        }

        out
    }
}

impl Default for ExplanationGenerator {
    fn default() -> Self {
        Self::new(&ExplainConfig::default())
    }
}
