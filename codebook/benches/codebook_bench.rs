use criterion::{black_box, criterion_group, criterion_main, Criterion};
use giztoy_codebook::{BinaryVector, Cluster, Codebook, TrainConfig, Trainer};

fn random_vec(bits: usize, seed: u64) -> BinaryVector {
    let mut v = BinaryVector::zeros(bits);
    let mut state = seed;
    for i in 0..bits {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        if (state >> 33) & 1 == 1 {
            v.set(i, true);
        }
    }
    v
}

fn make_cluster(center: &BinaryVector, n: usize, noise: usize, base_seed: u64) -> Vec<BinaryVector> {
    (0..n)
        .map(|i| {
            let mut v = center.clone();
            let mut state = base_seed.wrapping_add(i as u64 * 997);
            for _ in 0..noise {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                v.flip((state >> 33) as usize % center.len());
            }
            v
        })
        .collect()
}

fn bench_quantize(c: &mut Criterion) {
    let bits = 256;
    let cb = Codebook::from_clusters(
        (0..1024)
            .map(|i| Cluster::new(i, random_vec(bits, i as u64 + 1)))
            .collect(),
    );
    let query = random_vec(bits, 999_999);

    c.bench_function("codebook_quantize_256b_1024words", |b| {
        b.iter(|| {
            let _ = black_box(cb.quantize(black_box(&query)));
        });
    });

    let queries: Vec<BinaryVector> = (0..4096).map(|i| random_vec(bits, 10_000 + i)).collect();
    c.bench_function("codebook_quantize_batch_256b_1024words_4096q", |b| {
        b.iter(|| {
            let _ = black_box(cb.quantize_batch(black_box(&queries)));
        });
    });
}

fn bench_train(c: &mut Criterion) {
    let bits = 128;
    let mut points = Vec::new();
    for k in 0..16u64 {
        let center = random_vec(bits, k + 100);
        points.extend(make_cluster(&center, 64, 8, k * 1000));
    }

    c.bench_function("codebook_train_128b_1024points_16words", |b| {
        b.iter(|| {
            let t = Trainer::new(TrainConfig::new(16));
            let _ = black_box(t.train(black_box(&points)));
        });
    });
}

criterion_group!(benches, bench_quantize, bench_train);
criterion_main!(benches);
