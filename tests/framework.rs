use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::Arc;
use swarmlab::algorithms::{DifferentialEvolution, GreyWolfOptimizer, ParticleSwarm};
use swarmlab::ops::{FnProblem, Limit, Problem, ProblemBounds, ProblemError, ProblemResult};
use swarmlab::{
    default_initialization, get_best, Algorithm, AlgorithmResult, Benchmark, BenchmarkKind,
    Generation, Individual, OptimizationType, OptimizeError, Optimizer, Population,
    PopulationError, Setup, StopCondition, Task, TaskError, TaskResult,
};

fn sphere(dimension: usize, bound: f64) -> Benchmark {
    Benchmark::with_bounds(BenchmarkKind::Sphere, dimension, &[-bound], &[bound]).unwrap()
}

#[test]
fn sphere_run_spends_exactly_its_budget() {
    let mut task = Task::builder(sphere(10, 5.12)).max_evals(200).build().unwrap();
    let mut optimizer = Optimizer::builder(ParticleSwarm::default())
        .population_size(25)
        .seed(1)
        .build()
        .unwrap();
    let outcome = optimizer.run(&mut task).unwrap();
    assert_eq!(outcome.evaluations, 200);
    assert_eq!(task.evals(), 200);
    let (best_x, best_fitness) = outcome.best();
    let best_x = best_x.unwrap();
    assert!(task.is_feasible(best_x));
    assert!((sphere(10, 5.12).evaluate(best_x).unwrap() - best_fitness).abs() < 1e-12);
    assert!(task.stopping_condition());
    assert!(task.stopping_condition());
}

#[test]
fn iteration_budget_counts_iterations_not_evaluations() {
    let mut task = Task::builder(sphere(4, 5.0)).max_iters(10).build().unwrap();
    let mut optimizer = Optimizer::builder(DifferentialEvolution::default())
        .population_size(10)
        .seed(2)
        .build()
        .unwrap();
    let outcome = optimizer.run(&mut task).unwrap();
    assert_eq!(outcome.iterations, 10);
    assert_eq!(outcome.evaluations, 10 * 11);
    assert_eq!(outcome.stats.generations(), 11);
}

#[test]
fn limit_repair_clamps_to_the_nearest_bound() {
    let task = Task::builder(sphere(2, 5.0)).repair(Limit).build().unwrap();
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    assert_eq!(
        task.repair(vec![10.0, -10.0], &mut rng).unwrap(),
        vec![5.0, -5.0]
    );
}

#[test]
fn maximisation_reports_user_terms() {
    let hill = FnProblem::with_dimension(3, &[-2.0], &[2.0], |x: &[f64]| {
        10.0 - x.iter().map(|v| v * v).sum::<f64>()
    })
    .unwrap()
    .with_name("hill");
    let mut task = Task::builder(hill)
        .optimization_type(OptimizationType::Maximization)
        .max_evals(1_500)
        .build()
        .unwrap();
    let mut optimizer = Optimizer::builder(DifferentialEvolution::default())
        .population_size(15)
        .seed(3)
        .build()
        .unwrap();
    let outcome = optimizer.run(&mut task).unwrap();
    assert!(outcome.best_fitness > 9.0 && outcome.best_fitness <= 10.0);
    assert_eq!(task.best_fitness(), Some(outcome.best_fitness));
    assert_eq!(outcome.metadata.problem, "hill");
    for pair in outcome.stats.best_fitness.windows(2) {
        assert!(pair[1] >= pair[0]);
    }
    for pair in outcome.convergence.fitness().windows(2) {
        assert!(pair[1] > pair[0]);
    }
}

#[test]
fn target_fitness_stops_the_run_early() {
    let mut task = Task::builder(sphere(2, 5.0))
        .stop_condition(StopCondition::target_fitness(0.5).or(StopCondition::max_evaluations(50_000)))
        .build()
        .unwrap();
    let mut optimizer = Optimizer::builder(ParticleSwarm::default())
        .seed(4)
        .build()
        .unwrap();
    let outcome = optimizer.run(&mut task).unwrap();
    assert!(outcome.best_fitness <= 0.5);
    assert!(outcome.evaluations < 50_000);
}

#[test]
fn budget_equal_to_population_stops_after_initialisation() {
    let mut task = Task::builder(sphere(3, 5.0)).max_evals(12).build().unwrap();
    let mut optimizer = Optimizer::builder(GreyWolfOptimizer::default())
        .population_size(12)
        .seed(5)
        .build()
        .unwrap();
    let outcome = optimizer.run(&mut task).unwrap();
    assert_eq!(outcome.evaluations, 12);
    assert_eq!(outcome.iterations, 0);
}

#[test]
fn wrong_length_fails_without_counting() {
    let mut task = Task::builder(sphere(2, 5.0)).max_evals(5).build().unwrap();
    let err = task.eval(&[1.0, 2.0, 3.0]).unwrap_err();
    assert_eq!(
        err,
        TaskError::Problem(ProblemError::DimensionMismatch {
            expected: 2,
            found: 3
        })
    );
    assert_eq!(task.evals(), 0);
}

#[test]
fn exhausted_task_returns_the_sentinel() {
    let mut task = Task::builder(sphere(2, 5.0)).max_evals(2).build().unwrap();
    assert_eq!(task.eval(&[1.0, 1.0]).unwrap(), 2.0);
    assert_eq!(task.eval(&[0.0, 1.0]).unwrap(), 1.0);
    assert!(task.stopping_condition());
    assert_eq!(task.eval(&[0.0, 0.0]).unwrap(), f64::INFINITY);
    assert_eq!(task.evals(), 2);
    assert_eq!(task.best_fitness(), Some(1.0));
}

#[test]
fn identical_seeds_give_identical_best_sequences() {
    let run = |seed| {
        let mut task = Task::builder(sphere(5, 5.0)).max_evals(400).build().unwrap();
        let mut optimizer = Optimizer::builder(ParticleSwarm::default())
            .population_size(20)
            .seed(seed)
            .build()
            .unwrap();
        optimizer
            .iterations(&mut task)
            .map(|report| report.map(|report| (report.best_fitness, report.best_x)))
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    };
    assert_eq!(run(9), run(9));
    assert_ne!(run(9), run(10));
}

struct Faulty;

impl ProblemBounds for Faulty {
    fn dimensions(&self) -> usize {
        2
    }

    fn lower_bounds(&self) -> &[f64] {
        &[-1.0, -1.0]
    }

    fn upper_bounds(&self) -> &[f64] {
        &[1.0, 1.0]
    }
}

impl Problem for Faulty {
    fn objective(&self, x: &[f64]) -> ProblemResult<f64> {
        if x[1] < 0.0 {
            Err(ProblemError::Evaluation(String::from("sensor offline")))
        } else {
            Ok(x[1])
        }
    }
}

#[test]
fn failures_on_a_worker_thread_are_captured() {
    let worker = std::thread::spawn(|| {
        let mut task = Task::shared(Arc::new(Faulty)).max_evals(100).build().unwrap();
        let mut optimizer = Optimizer::builder(ParticleSwarm::default())
            .population_size(10)
            .seed(6)
            .build()
            .unwrap();
        let result = optimizer.run(&mut task);
        (result, optimizer.bad_run(), optimizer.failure().cloned())
    });
    let (result, bad_run, failure) = worker.join().unwrap();
    assert!(bad_run);
    let err = result.unwrap_err();
    assert!(matches!(
        err,
        OptimizeError::Task(TaskError::Problem(ProblemError::Evaluation(_)))
    ));
    assert_eq!(failure, Some(err));
}

/// Redraws the population each iteration and gives up at a chosen one.
struct Redraw {
    give_up_at: usize,
}

impl Algorithm for Redraw {
    type Member = Vec<f64>;
    type State = usize;

    const NAMES: &'static [&'static str] = &["Redraw"];

    fn init_population(
        &mut self,
        task: &mut Task,
        setup: &mut Setup<'_, Vec<f64>>,
    ) -> AlgorithmResult<(Population<Vec<f64>>, usize)> {
        Ok((setup.initialize(task)?, 0))
    }

    fn run_iteration(
        &mut self,
        task: &mut Task,
        generation: Generation<Vec<f64>, usize>,
        rng: &mut StdRng,
    ) -> AlgorithmResult<Generation<Vec<f64>, usize>> {
        if generation.state == self.give_up_at {
            return Err(OptimizeError::Algorithm {
                algorithm: "Redraw",
                message: String::from("gave up"),
            });
        }
        let population = default_initialization(task, generation.population.len(), rng)?;
        let best = get_best(&population, generation.best);
        Ok(Generation {
            population,
            best,
            state: generation.state + 1,
        })
    }
}

#[test]
fn iteration_failures_on_a_worker_thread_are_captured() {
    let worker = std::thread::spawn(|| {
        let mut task = Task::builder(sphere(2, 1.0)).max_evals(1_000).build().unwrap();
        let mut optimizer = Optimizer::builder(Redraw { give_up_at: 3 })
            .population_size(5)
            .seed(8)
            .build()
            .unwrap();
        let result = optimizer.run(&mut task);
        (result, optimizer.bad_run(), task.evals(), task.iters())
    });
    let (result, bad_run, evals, iters) = worker.join().unwrap();
    assert!(bad_run);
    assert_eq!(
        result.unwrap_err(),
        OptimizeError::Algorithm {
            algorithm: "Redraw",
            message: String::from("gave up")
        }
    );
    assert_eq!(evals, 5 * 4);
    assert_eq!(iters, 3);
}

fn two_individuals(
    task: &mut Task,
    _size: usize,
    rng: &mut dyn RngCore,
) -> TaskResult<Population<Individual>> {
    default_initialization(task, 2, rng)
}

#[test]
fn short_initial_population_is_an_error() {
    let mut task = Task::builder(sphere(3, 5.0)).max_evals(200).build().unwrap();
    let mut optimizer = Optimizer::builder(DifferentialEvolution::default())
        .population_size(10)
        .initialization(two_individuals)
        .seed(11)
        .build()
        .unwrap();
    assert_eq!(
        optimizer.run(&mut task).unwrap_err(),
        OptimizeError::Population(PopulationError::WrongSize {
            expected: 10,
            found: 2
        })
    );
    assert!(optimizer.bad_run());
}

#[test]
fn spent_budget_does_not_leak_into_statistics() {
    let mut task = Task::builder(sphere(3, 5.0))
        .optimization_type(OptimizationType::Maximization)
        .max_evals(100)
        .build()
        .unwrap();
    let mut optimizer = Optimizer::builder(ParticleSwarm::default())
        .population_size(12)
        .seed(12)
        .build()
        .unwrap();
    let outcome = optimizer.run(&mut task).unwrap();
    assert_eq!(outcome.evaluations, 100);
    assert!(outcome.stats.mean_fitness.iter().all(|v| v.is_finite()));
    assert!(outcome.stats.median_fitness.iter().all(|v| v.is_finite()));
    let last_mean = *outcome.stats.mean_fitness.last().unwrap();
    assert!((0.0..=75.0).contains(&last_mean));
}

#[test]
fn events_flow_to_an_installed_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
    let mut task = Task::builder(sphere(2, 5.0)).max_iters(2).build().unwrap();
    let mut optimizer = Optimizer::builder(GreyWolfOptimizer::default())
        .population_size(5)
        .seed(7)
        .build()
        .unwrap();
    assert!(optimizer.run(&mut task).is_ok());
}
