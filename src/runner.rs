//! Batch experiments: every algorithm against every problem, several times.
//!
//! Jobs are independent and run on the rayon thread pool. Each builds its own
//! task and solver, so nothing is shared between threads apart from custom
//! problems, which must be `Send + Sync` anyway. A job that fails is logged
//! and recorded; the rest of the batch carries on.
//!
//! ```
//! use swarmlab::runner::Runner;
//!
//! let results = Runner::new(2, 60)
//!     .algorithms(["de", "pso"])
//!     .problems(["sphere"])
//!     .runs(2)
//!     .population_size(10)
//!     .seed(7)
//!     .run()
//!     .unwrap();
//! let runs = results.get("DifferentialEvolution", "sphere").unwrap();
//! assert_eq!(runs.len(), 2);
//! assert!(runs.iter().all(|record| record.evaluations == 60));
//! ```

use crate::algorithm::AlgorithmConfig;
use crate::ops::Problem;
use crate::registry::{algorithm_by_name, problem_by_name, RegistryError};
use crate::task::{Task, TaskError};
use crate::{OptimizeError, RunOutcome};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Batch failures. Individual run failures are not errors; they are stored
/// in [`RunRecord::error`].
#[derive(Debug, Error)]
pub enum RunnerError {
    /// An algorithm or problem name did not resolve.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// A task could not be configured.
    #[error(transparent)]
    Task(#[from] TaskError),
    /// Serialising the results failed.
    #[cfg(feature = "serde")]
    #[error("failed to serialise results: {0}")]
    Json(#[from] serde_json::Error),
    /// Writing the results failed.
    #[error("failed to write results: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of one run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    /// Run index within its algorithm/problem pair.
    pub run: usize,
    /// Seed used for the run, if the batch was seeded.
    pub seed: Option<u64>,
    /// Best position, absent for a failed run.
    pub best_x: Option<Vec<f64>>,
    /// Best fitness in user terms, absent for a failed run.
    pub best_fitness: Option<f64>,
    /// Evaluations consumed, including those before a failure.
    pub evaluations: usize,
    /// Iterations completed.
    pub iterations: usize,
    /// Failure message of a failed run.
    pub error: Option<String>,
}

impl RunRecord {
    fn from_result(
        run: usize,
        seed: Option<u64>,
        task: &Task,
        result: Result<RunOutcome, OptimizeError>,
    ) -> Self {
        match result {
            Ok(outcome) => Self {
                run,
                seed,
                best_x: outcome.best_x,
                best_fitness: Some(outcome.best_fitness),
                evaluations: outcome.evaluations,
                iterations: outcome.iterations,
                error: None,
            },
            Err(err) => Self {
                run,
                seed,
                best_x: None,
                best_fitness: None,
                evaluations: task.evals(),
                iterations: task.iters(),
                error: Some(err.to_string()),
            },
        }
    }

    /// Whether the run ended with an error.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Runs grouped by algorithm, then problem.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunnerResults {
    runs: BTreeMap<String, BTreeMap<String, Vec<RunRecord>>>,
}

impl RunnerResults {
    /// Runs of one algorithm/problem pair, by canonical algorithm name and
    /// problem name.
    #[must_use]
    pub fn get(&self, algorithm: &str, problem: &str) -> Option<&[RunRecord]> {
        self.runs
            .get(algorithm)
            .and_then(|problems| problems.get(problem))
            .map(Vec::as_slice)
    }

    /// All groups.
    #[must_use]
    pub fn by_algorithm(&self) -> &BTreeMap<String, BTreeMap<String, Vec<RunRecord>>> {
        &self.runs
    }

    /// Total number of runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    /// Whether no run was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of failed runs.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.runs
            .values()
            .flat_map(BTreeMap::values)
            .flatten()
            .filter(|record| record.failed())
            .count()
    }

    /// Pretty-printed JSON of the grouped results.
    ///
    /// # Errors
    /// Propagates serialisation failures.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, RunnerError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes [`Self::to_json`] to `path`.
    ///
    /// # Errors
    /// Propagates serialisation and I/O failures.
    #[cfg(feature = "serde")]
    pub fn export_json(&self, path: impl AsRef<std::path::Path>) -> Result<(), RunnerError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[derive(Clone)]
enum ProblemSource {
    Named(String),
    Custom(String, Arc<dyn Problem>),
}

impl fmt::Debug for ProblemSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Custom(name, _) => f.debug_tuple("Custom").field(name).finish(),
        }
    }
}

/// Configures and executes a batch.
#[derive(Debug, Clone)]
pub struct Runner {
    dimension: usize,
    max_evals: usize,
    runs: usize,
    population_size: Option<usize>,
    seed: Option<u64>,
    algorithms: Vec<String>,
    problems: Vec<ProblemSource>,
}

struct Job<'a> {
    algorithm: &'a str,
    problem: &'a ProblemSource,
    run: usize,
    seed: Option<u64>,
}

impl Runner {
    /// A batch over `dimension`-dimensional benchmarks with an evaluation
    /// budget of `max_evals` per run. One run per pair by default.
    #[must_use]
    pub fn new(dimension: usize, max_evals: usize) -> Self {
        Self {
            dimension,
            max_evals,
            runs: 1,
            population_size: None,
            seed: None,
            algorithms: Vec::new(),
            problems: Vec::new(),
        }
    }

    /// Algorithm names, as accepted by [`algorithm_by_name`].
    #[must_use]
    pub fn algorithms<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.algorithms.extend(names.into_iter().map(Into::into));
        self
    }

    /// Benchmark names, as accepted by [`problem_by_name`].
    #[must_use]
    pub fn problems<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.problems
            .extend(names.into_iter().map(|name| ProblemSource::Named(name.into())));
        self
    }

    /// Adds a user-defined problem under `name`. Its own dimension is used.
    #[must_use]
    pub fn custom_problem(mut self, name: impl Into<String>, problem: Arc<dyn Problem>) -> Self {
        self.problems.push(ProblemSource::Custom(name.into(), problem));
        self
    }

    /// Runs per algorithm/problem pair.
    #[must_use]
    pub fn runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    /// Population size handed to every algorithm.
    #[must_use]
    pub fn population_size(mut self, size: usize) -> Self {
        self.population_size = Some(size);
        self
    }

    /// Base seed. Job `k` of the batch is seeded with `seed + k`.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Executes the batch.
    ///
    /// # Errors
    /// Fails before running anything when a name does not resolve or a
    /// benchmark cannot be built for the dimension.
    pub fn run(&self) -> Result<RunnerResults, RunnerError> {
        let mut canonical = Vec::with_capacity(self.algorithms.len());
        for name in &self.algorithms {
            canonical.push(algorithm_by_name(name, &AlgorithmConfig::default())?.name());
        }
        for problem in &self.problems {
            if let ProblemSource::Named(name) = problem {
                problem_by_name(name, self.dimension)?;
            }
        }

        let mut jobs = Vec::new();
        for algorithm in &self.algorithms {
            for problem in &self.problems {
                for run in 0..self.runs {
                    let seed = self.seed.map(|base| base.wrapping_add(jobs.len() as u64));
                    jobs.push(Job {
                        algorithm,
                        problem,
                        run,
                        seed,
                    });
                }
            }
        }
        info!(jobs = jobs.len(), "batch started");

        let records: Vec<(String, String, RunRecord)> = jobs
            .into_par_iter()
            .map(|job| self.execute(&job))
            .collect::<Result<_, _>>()?;

        let mut results = RunnerResults::default();
        for (algorithm, problem, record) in records {
            results
                .runs
                .entry(algorithm)
                .or_default()
                .entry(problem)
                .or_default()
                .push(record);
        }
        for problems in results.runs.values_mut() {
            for runs in problems.values_mut() {
                runs.sort_by_key(|record| record.run);
            }
        }
        info!(
            runs = results.len(),
            failures = results.failures(),
            algorithms = ?canonical,
            "batch finished"
        );
        Ok(results)
    }

    fn execute(&self, job: &Job<'_>) -> Result<(String, String, RunRecord), RunnerError> {
        let mut config = AlgorithmConfig::default();
        config.population_size = self.population_size;
        config.seed = job.seed;
        let mut solver = algorithm_by_name(job.algorithm, &config)?;
        let (name, builder) = match job.problem {
            ProblemSource::Named(name) => {
                let problem = problem_by_name(name, self.dimension)?;
                (problem.name().to_owned(), Task::builder(problem))
            }
            ProblemSource::Custom(name, problem) => {
                (name.clone(), Task::shared(Arc::clone(problem)))
            }
        };
        let mut task = builder.max_evals(self.max_evals).build()?;
        let result = solver.run(&mut task);
        if let Err(err) = &result {
            warn!(
                algorithm = solver.name(),
                problem = %name,
                run = job.run,
                error = %err,
                "run failed"
            );
        }
        let record = RunRecord::from_result(job.run, job.seed, &task, result);
        Ok((solver.name().to_owned(), name, record))
    }
}
