//! Benchmarks for the probability model

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use oddsflow::config::ModelConfig;
use oddsflow::market::OddsQuote;
use oddsflow::model::{simulate_outcomes, ProbabilityModel};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn benchmark_poisson_simulation(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);

    c.bench_function("simulate_outcomes_800", |b| {
        b.iter(|| simulate_outcomes(black_box(1.45), black_box(1.10), 800, &mut rng))
    });
}

fn benchmark_full_estimate(c: &mut Criterion) {
    let model = ProbabilityModel::new(ModelConfig::default());
    let now = OddsQuote::new(1.95, 3.60, 3.80);

    c.bench_function("model_estimate", |b| {
        b.iter(|| model.estimate_seeded(black_box(&now), 42))
    });
}

criterion_group!(benches, benchmark_poisson_simulation, benchmark_full_estimate);
criterion_main!(benches);
