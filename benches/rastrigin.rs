use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use swarmlab::registry::{algorithm_by_name, algorithm_names, problem_by_name};
use swarmlab::{AlgorithmConfig, Task};

const DIMENSIONS: usize = 20;
const EVALUATIONS: usize = 10_000;

fn rastrigin_task() -> Task {
    let problem = problem_by_name("rastrigin", DIMENSIONS).expect("known problem");
    Task::builder(problem)
        .max_evals(EVALUATIONS)
        .build()
        .expect("valid task")
}

fn rastrigin_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("rastrigin");
    group.sample_size(20);
    let config = AlgorithmConfig::default().with_seed(42);
    for name in algorithm_names() {
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter_batched(
                || {
                    let solver = algorithm_by_name(name, &config).expect("registered algorithm");
                    (solver, rastrigin_task())
                },
                |(mut solver, mut task)| {
                    solver.run(&mut task).expect("optimization to succeed");
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, rastrigin_benchmark);
criterion_main!(benches);
