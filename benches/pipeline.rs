//! Pipeline benchmark: batch → aggregate pass → engineered features → aligned vectors.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pay_anomaly::features::{FeatureEngineer, ProfileAggregator, TrainingSchema};
use pay_anomaly::Transaction;

const CURRENCIES: [&str; 3] = ["GBP", "EUR", "USD"];
const CHANNELS: [&str; 4] = ["mobile", "internet", "batch", "internal"];

fn make_batch(n: usize) -> Vec<Transaction> {
    let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap();
    (0..n)
        .map(|i| Transaction {
            txn_id: format!("T{}", 1_000_000 + i),
            debtor_id: format!("D{:04}", i % 500),
            amount: 50.0 + (i % 97) as f64 * 31.0,
            currency: CURRENCIES[i % CURRENCIES.len()].to_string(),
            channel: CHANNELS[i % CHANNELS.len()].to_string(),
            creditor_name: format!("Creditor {}", i % 300),
            creditor_account: format!("GB00BENCH{:06}", i % 1_000),
            remittance_info: "Payment".to_string(),
            execution_time: Some(format!("{:02}:{:02}", i % 24, i % 60)),
            timestamp: ts,
            country: Some(["UK", "DE", "FR", "US"][i % 4].to_string()),
            injected_reason: None,
        })
        .collect()
}

fn bench_encode(c: &mut Criterion) {
    let schema = TrainingSchema::standard(&CURRENCIES, &CHANNELS).unwrap();
    let engineer = FeatureEngineer::new(schema);
    let batch = make_batch(10_000);

    c.bench_function("encode_10k_transactions", |b| {
        b.iter(|| black_box(engineer.encode(black_box(&batch))))
    });
}

fn bench_profiles(c: &mut Criterion) {
    let aggregator = ProfileAggregator::default();
    let batch = make_batch(10_000);

    c.bench_function("aggregate_profiles_10k", |b| {
        b.iter(|| black_box(aggregator.aggregate(black_box(&batch))))
    });
}

criterion_group!(benches, bench_encode, bench_profiles);
criterion_main!(benches);
