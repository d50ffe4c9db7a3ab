//! Feature engineering, schema alignment and debtor profiles.

mod common;

use common::txn;
use pay_anomaly::features::{
    align, BatchStats, FeatureEngineer, FeatureTable, ProfileAggregator, ProfileTable, TrainingSchema,
    DEBTOR_FEATURES,
};
use pay_anomaly::ingest::DEFAULT_HOUR;

fn schema() -> TrainingSchema {
    TrainingSchema::standard(&["EUR", "GBP", "USD"], &["batch", "internal", "internet", "mobile"]).unwrap()
}

#[test]
fn hour_falls_back_to_noon() {
    let mut t = txn("T1", "D1", 10.0, "GBP", "mobile");
    t.execution_time = Some("09:45".into());
    assert_eq!(t.hour(), 9);
    t.execution_time = None;
    assert_eq!(t.hour(), DEFAULT_HOUR);
    t.execution_time = Some("lunch".into());
    assert_eq!(t.hour(), 12);
    t.execution_time = Some("25:00".into());
    assert_eq!(t.hour(), 12);
}

#[test]
fn batch_frequencies_and_counts() {
    let mut batch = vec![
        txn("T1", "D1", 100.0, "GBP", "mobile"),
        txn("T2", "D1", 200.0, "GBP", "internet"),
        txn("T3", "D2", 300.0, "EUR", "mobile"),
    ];
    batch[1].creditor_account = batch[0].creditor_account.clone();
    batch[2].country = None;

    let stats = BatchStats::compute(&batch);
    assert_eq!(stats.len(), 3);
    assert_eq!(stats.debtor_txn_count("D1"), 2);
    assert_eq!(stats.debtor_txn_count("D9"), 0);
    assert_eq!(stats.creditor_freq(&batch[0].creditor_account), 2);
    assert_eq!(stats.currency_freq("GBP"), 2);
    assert_eq!(stats.channel_freq("mobile"), 2);
    assert_eq!(stats.country_currency_freq(Some("UK"), "GBP"), 2);
    assert_eq!(stats.country_currency_freq(None, "EUR"), 0);

    let engineer = FeatureEngineer::new(schema());
    let features = engineer.engineer(&batch, &stats);
    assert!((features[0].log_amount - 101f64.ln()).abs() < 1e-12);
    assert_eq!(features[0].hour, 10);
    assert_eq!(features[2].country_currency_freq, 0);
}

#[test]
fn global_z_uses_sample_std() {
    let batch = vec![
        txn("T1", "D1", 1.0, "GBP", "mobile"),
        txn("T2", "D1", 2.0, "GBP", "mobile"),
        txn("T3", "D1", 3.0, "GBP", "mobile"),
    ];
    let stats = BatchStats::compute(&batch);
    // mean 2, sample std 1
    assert!((stats.global_z(3.0) - 1.0).abs() < 1e-12);
    // population std sqrt(2/3)
    let expected = 1.0 / (2.0f64 / 3.0).sqrt();
    assert!((stats.peer_z("mobile", "GBP", 3.0) - expected).abs() < 1e-12);
}

#[test]
fn zero_variance_peer_group_gives_zero() {
    let batch = vec![
        txn("T1", "D1", 50.0, "GBP", "mobile"),
        txn("T2", "D2", 50.0, "GBP", "mobile"),
        txn("T3", "D3", 9000.0, "EUR", "batch"),
    ];
    let stats = BatchStats::compute(&batch);
    assert_eq!(stats.peer_z("mobile", "GBP", 50.0), 0.0);
    // single-member group: undefined std
    assert_eq!(stats.peer_z("batch", "EUR", 9000.0), 0.0);
    assert_eq!(stats.peer_z("batch", "JPY", 1.0), 0.0);

    let single = BatchStats::compute(&batch[..1]);
    assert_eq!(single.global_z(50.0), 0.0);
}

#[test]
fn unseen_category_adds_no_column() {
    let batch = vec![
        txn("T1", "D1", 10.0, "CHF", "telex"),
        txn("T2", "D2", 20.0, "GBP", "mobile"),
    ];
    let schema = schema();
    let engineer = FeatureEngineer::new(schema.clone());
    let stats = BatchStats::compute(&batch);
    let features = engineer.engineer(&batch, &stats);
    let table = engineer.table(&batch, &features);
    assert!(table.column_index("cur_CHF").is_none());
    assert!(table.column_index("ch_telex").is_none());

    let vectors = engineer.encode(&batch).vectors;
    assert_eq!(&vectors[0].columns[..], &schema.columns()[..]);
    for c in schema.columns().iter().filter(|c| c.starts_with("cur_") || c.starts_with("ch_")) {
        assert_eq!(vectors[0].get(c), Some(0.0), "{}", c);
    }
    assert_eq!(vectors[1].get("cur_GBP"), Some(1.0));
    assert_eq!(vectors[1].get("ch_mobile"), Some(1.0));
    assert_eq!(vectors[1].get("cur_EUR"), Some(0.0));
}

#[test]
fn align_fills_drops_and_orders() {
    let mut table = FeatureTable::new(vec!["b".into(), "extra".into(), "a".into()]);
    table.push_row("r1", vec![2.0, 99.0, 1.0]);
    table.push_row("r2", vec![f64::NAN, 98.0, 3.0]);
    let schema = TrainingSchema::new(vec!["a".into(), "b".into(), "missing".into()]).unwrap();

    let out = align(&table, &schema);
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].txn_id, "r1");
    assert_eq!(out[1].txn_id, "r2");
    for v in &out {
        assert_eq!(&v.columns[..], &schema.columns()[..]);
        assert_eq!(v.values[2], 0.0);
    }
    assert_eq!(out[0].values, vec![1.0, 2.0, 0.0]);
    assert_eq!(out[1].values, vec![3.0, 0.0, 0.0]);
}

#[test]
fn encoding_is_deterministic() {
    let mut batch: Vec<_> = (0..40)
        .map(|i| {
            let cur = ["GBP", "EUR", "USD", "JPY"][i % 4];
            let ch = ["mobile", "internet", "batch"][i % 3];
            txn(&format!("T{}", i), &format!("D{}", i % 7), 10.0 * (i as f64 + 1.0), cur, ch)
        })
        .collect();
    batch[3].country = None;
    batch[5].execution_time = Some("??".into());

    let engineer = FeatureEngineer::new(schema());
    let first = engineer.encode(&batch);
    let second = engineer.encode(&batch);
    assert_eq!(first.vectors, second.vectors);
    assert_eq!(first.features, second.features);
    assert!(first.vectors.iter().all(|v| v.values.iter().all(|x| x.is_finite())));
}

#[test]
fn schema_rejects_duplicates_and_reads_json_array() {
    assert!(TrainingSchema::new(vec!["a".into(), "a".into()]).is_err());
    assert!(TrainingSchema::new(Vec::new()).is_err());

    let s: TrainingSchema = serde_json::from_str(r#"["log_amount","hour","cur_GBP","ch_mobile"]"#).unwrap();
    assert_eq!(s.len(), 4);
    assert_eq!(s.vocabulary("cur_"), vec!["GBP".to_string()]);
    assert_eq!(s.vocabulary("ch_"), vec!["mobile".to_string()]);
    assert!(serde_json::from_str::<TrainingSchema>(r#"["a","a"]"#).is_err());

    let reordered = TrainingSchema::new(vec!["hour".into(), "log_amount".into(), "cur_GBP".into(), "ch_mobile".into()]).unwrap();
    assert_eq!(s.fingerprint(), s.clone().fingerprint());
    assert_ne!(s.fingerprint(), reordered.fingerprint());
}

#[test]
fn single_transaction_debtor_profile() {
    let batch = vec![txn("T1", "D7", 42.0, "GBP", "mobile")];
    let profiles = ProfileAggregator::default().aggregate(&batch);
    assert_eq!(profiles.len(), 1);
    let p = &profiles[0];
    assert_eq!(p.txn_count, 1);
    assert_eq!(p.std_amt, 0.0);
    assert_eq!(p.unique_payees, 1);
    assert_eq!(p.mobile_pct, 1.0);
    assert_eq!(p.median_amt, 42.0);
}

#[test]
fn debtor_profile_statistics() {
    let mut batch = vec![
        txn("T1", "D0001", 100.0, "GBP", "internet"),
        txn("T2", "D0001", 100.0, "GBP", "internet"),
        txn("T3", "D0001", 5000.0, "GBP", "internet"),
        txn("T4", "D0002", 10.0, "EUR", "mobile"),
        txn("T5", "D0002", 30.0, "EUR", "internet"),
    ];
    batch[1].creditor_account = batch[0].creditor_account.clone();

    let profiles = ProfileAggregator::new("mobile").aggregate(&batch);
    assert_eq!(profiles.len(), 2);
    let d1 = &profiles[0];
    assert_eq!(d1.debtor_id, "D0001");
    assert_eq!(d1.txn_count, 3);
    assert!((d1.avg_amt - 1733.333).abs() < 0.01);
    assert_eq!(d1.median_amt, 100.0);
    assert!(d1.std_amt > 0.0);
    assert!((d1.std_amt - 2829.016).abs() < 0.01);
    assert_eq!(d1.unique_payees, 2);
    assert_eq!(d1.mobile_pct, 0.0);

    let d2 = &profiles[1];
    assert_eq!(d2.median_amt, 20.0);
    assert_eq!(d2.mobile_pct, 0.5);
}

#[test]
fn unknown_debtor_gets_zero_features() {
    let batch = vec![txn("T1", "D1", 10.0, "GBP", "mobile"), txn("T2", "D1", 30.0, "GBP", "mobile")];
    let table = ProfileTable::new(ProfileAggregator::default().aggregate(&batch));

    let known = table.features_for(&batch[0]);
    assert_eq!(known.columns.len(), DEBTOR_FEATURES.len());
    assert_eq!(known.get("txn_count"), Some(2.0));
    assert_eq!(known.get("avg_amt"), Some(20.0));

    let stranger = txn("T9", "D404", 10.0, "GBP", "mobile");
    let v = table.features_for(&stranger);
    assert_eq!(v.values, vec![0.0; DEBTOR_FEATURES.len()]);
    assert!(table.get("D404").is_none());
}

#[test]
fn aligned_table_exports_as_csv() {
    let batch = vec![txn("T1", "D1", 10.0, "GBP", "mobile")];
    let vectors = FeatureEngineer::new(schema()).encode(&batch).vectors;
    let table = FeatureTable::from(vectors.as_slice());
    assert_eq!(table.len(), 1);

    let mut out = Vec::new();
    table.write_csv(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let mut lines = text.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("txn_id,log_amount,hour,debtor_txn_count"));
    assert!(header.ends_with("cur_EUR,cur_GBP,cur_USD"));
    assert!(lines.next().unwrap().starts_with("T1,"));
}
