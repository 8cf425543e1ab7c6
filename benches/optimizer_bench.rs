//! Criterion benchmarks comparing the optimization methods on a
//! representative corn scenario.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fertisched::dp::{DpConfig, DpRunner};
use fertisched::ga::{GaConfig, GaRunner};
use fertisched::model::{ApplicationMethod, NutrientType, SchedulingProblem};
use fertisched::mo::MoRunner;

fn corn(horizon: u32) -> SchedulingProblem {
    SchedulingProblem::new("bench-field", "corn", horizon)
        .with_requirement(NutrientType::Nitrogen, 150.0)
        .with_requirement(NutrientType::Phosphorus, 50.0)
        .with_methods(&[ApplicationMethod::Broadcast, ApplicationMethod::SideDress])
}

fn bench_dp_corn(c: &mut Criterion) {
    let mut group = c.benchmark_group("dp_corn");
    group.sample_size(10);

    for &horizon in &[60u32, 90, 120] {
        let problem = corn(horizon);
        let config = DpConfig::default();
        group.bench_with_input(
            BenchmarkId::from_parameter(horizon),
            &(problem, config),
            |b, (p, c)| {
                b.iter(|| {
                    let result = DpRunner::run(black_box(p), black_box(c));
                    black_box(result)
                })
            },
        );
    }
    group.finish();
}

fn bench_ga_corn(c: &mut Criterion) {
    let mut group = c.benchmark_group("ga_corn");
    group.sample_size(10);

    for (pop, gens) in [(50usize, 50usize), (100, 100), (200, 100)] {
        let problem = corn(120);
        let config = GaConfig::default()
            .with_population_size(pop)
            .with_max_generations(gens)
            .with_seed(42);
        group.bench_with_input(
            BenchmarkId::new("pop_gens", format!("p{}_g{}", pop, gens)),
            &(problem, config),
            |b, (p, c)| {
                b.iter(|| {
                    let result = GaRunner::run(black_box(p), black_box(c));
                    black_box(result)
                })
            },
        );
    }
    group.finish();
}

fn bench_mo_corn(c: &mut Criterion) {
    let mut group = c.benchmark_group("mo_corn");
    group.sample_size(10);

    for (pop, gens) in [(50usize, 30usize), (100, 50)] {
        let problem = corn(120);
        let config = GaConfig::default()
            .with_population_size(pop)
            .with_max_generations(gens)
            .with_seed(42);
        group.bench_with_input(
            BenchmarkId::new("pop_gens", format!("p{}_g{}", pop, gens)),
            &(problem, config),
            |b, (p, c)| {
                b.iter(|| {
                    let result = MoRunner::run(black_box(p), black_box(c));
                    black_box(result)
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_dp_corn, bench_ga_corn, bench_mo_corn);
criterion_main!(benches);
