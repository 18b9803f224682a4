#![warn(missing_docs)]

/*! Nature-inspired metaheuristics for box-constrained continuous optimisation.

Every algorithm in this crate runs on the same small framework:

* a [`Task`] wraps a [`ops::Problem`] with its bounds, a repair strategy, an
  optimisation direction and a stopping condition, and counts every
  evaluation;
* an [`Algorithm`] says how to build the first population and how to turn
  one [`Generation`] into the next;
* an [`Optimizer`] seeds the generator, drives the iterations, keeps the
  best-so-far from ever getting worse, calls [`Callback`]s and reports a
  [`RunOutcome`].

```
use swarmlab::algorithms::DifferentialEvolution;
use swarmlab::{Benchmark, BenchmarkKind, Optimizer, Task};

let problem = Benchmark::new(BenchmarkKind::Sphere, 10).unwrap();
let mut task = Task::builder(problem).max_evals(5_000).build().unwrap();
let algorithm = DifferentialEvolution::new()
    .differential_weight(0.5)
    .crossover_probability(0.9);
let mut optimizer = Optimizer::builder(algorithm)
    .population_size(30)
    .seed(42)
    .build()
    .unwrap();
let outcome = optimizer.run(&mut task).unwrap();
assert_eq!(outcome.evaluations, 5_000);
assert!(outcome.best_fitness < 1.0);
```

Algorithms can also be picked by name through [`registry`], and whole
algorithm-by-problem grids run in parallel through [`runner::Runner`].

The crate logs through [`tracing`] and never installs a subscriber; attach
one in the application to see run, iteration and improvement events.
!*/

pub mod algorithm;
pub mod algorithms;
pub mod core;
pub mod functions;
pub mod ops;
pub mod registry;
pub mod runner;
pub mod task;
pub mod util;

pub use crate::algorithm::{
    default_initialization, Algorithm, AlgorithmConfig, AlgorithmResult, Callback, CallbackList,
    ConfigError, Generation, GenerationReport, InitializationFn, IterationSnapshot, Iterations,
    OptimizeError, Optimizer, OptimizerBuilder, Parameters, Setup, Solver,
};
pub use crate::core::{
    get_best, Best, Convergence, Individual, Member, Population, PopulationError, RunMetadata,
    RunOutcome, RunStats,
};
pub use crate::functions::{Benchmark, BenchmarkKind};
pub use crate::registry::{algorithm_by_name, problem_by_name, RegistryError};
pub use crate::runner::{RunRecord, Runner, RunnerError, RunnerResults};
pub use crate::task::{OptimizationType, StopCondition, Task, TaskBuilder, TaskError, TaskResult};
