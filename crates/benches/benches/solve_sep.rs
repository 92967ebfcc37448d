use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::{rngs::SmallRng, SeedableRng};
use sepq_api::{Scalar, Settings, Solver};
use sepq_benches::random_feasible_params;

fn solve_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("admm_separable_solve");
    let mut rng = SmallRng::seed_from_u64(42);
    group.bench_function("n=50_m=20", |bencher| {
        bencher.iter_batched(
            || random_feasible_params(50, 20, &mut rng),
            |params| {
                let mut settings = Settings::<Scalar>::defaults(50, 20);
                settings.max_iters = 200;
                let solver = Solver::new().settings(settings);
                let _ = solver.solve(&params).unwrap();
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, solve_benchmark);
criterion_main!(benches);
