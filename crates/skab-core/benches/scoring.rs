use criterion::{black_box, criterion_group, criterion_main, Criterion};
use skab_core::{AnomalyModel, Dataset, PcaTrainer, SensorRecord, Trainer, CHANNEL_COUNT};

fn synthetic(n: usize) -> Dataset {
    (0..n)
        .map(|i| {
            let t = (i as f32 * 0.37).sin();
            let mut f = [0.0f32; CHANNEL_COUNT];
            for (k, v) in f.iter_mut().enumerate() {
                *v = t * (k + 1) as f32 + (i % 7) as f32 * 0.01;
            }
            SensorRecord::from_features(format!("t{i}"), f)
        })
        .collect::<Vec<_>>()
        .into()
}

fn bench_pca(c: &mut Criterion) {
    let data = synthetic(10_000);
    let trainer = PcaTrainer::default();

    c.bench_function("pca_fit_10k", |b| {
        b.iter(|| trainer.fit(black_box(&data)).unwrap())
    });

    let model = trainer.fit(&data).unwrap();
    c.bench_function("pca_score_10k", |b| {
        b.iter(|| model.score_all(black_box(data.records())))
    });
}

criterion_group!(benches, bench_pca);
criterion_main!(benches);
