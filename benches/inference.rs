//! Inference benchmark: feature vector → isolation forest score.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pay_anomaly::model::{IsolationForest, IsolationTree, Node};
use pay_anomaly::OutlierModel;

/// Balanced tree of `depth` levels splitting on a rotating feature.
fn tree(depth: usize, n_features: usize) -> IsolationTree {
    let mut nodes = Vec::new();
    let internal = (1usize << depth) - 1;
    let total = (1usize << (depth + 1)) - 1;
    for i in 0..total {
        if i < internal {
            nodes.push(Node::Split {
                feature: i % n_features,
                threshold: (i % 7) as f64 * 0.1,
                left: 2 * i + 1,
                right: 2 * i + 2,
            });
        } else {
            nodes.push(Node::Leaf { n_samples: 1 + i % 3 });
        }
    }
    IsolationTree { nodes }
}

fn forest(n_trees: usize, n_features: usize) -> IsolationForest {
    IsolationForest {
        n_features,
        feature_names: None,
        max_samples: 256,
        offset: -0.5,
        trees: (0..n_trees).map(|_| tree(8, n_features)).collect(),
    }
}

fn bench_forest_by_width(c: &mut Criterion) {
    let mut g = c.benchmark_group("forest_200_trees");
    for d in [5, 17, 32] {
        let model = forest(200, d);
        let row = vec![0.3f64; d];
        g.bench_function(format!("dim_{}", d).as_str(), |b| {
            b.iter(|| model.score(black_box(&row)).unwrap())
        });
    }
    g.finish();
}

criterion_group!(benches, bench_forest_by_width);
criterion_main!(benches);
