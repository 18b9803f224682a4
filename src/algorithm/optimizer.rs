//! The generic driver that runs any [`Algorithm`] against a [`Task`].

use crate::algorithm::callback::{Callback, CallbackList, IterationSnapshot};
use crate::algorithm::{
    default_initialization, Algorithm, ConfigError, Generation, InitializationFn, OptimizeError,
    Parameters, Setup,
};
use crate::core::{get_best, Best, PopulationError, RunMetadata, RunOutcome, RunStats};
use crate::task::Task;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, info_span, trace};

/// Settings shared by every algorithm, used by the name-based factory.
///
/// # Examples
/// ```
/// use swarmlab::AlgorithmConfig;
/// let config = AlgorithmConfig::default().with_population_size(20).with_seed(7);
/// assert_eq!(config.population_size, Some(20));
/// assert_eq!(config.seed, Some(7));
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlgorithmConfig {
    /// Population size; the algorithm's default when `None`.
    pub population_size: Option<usize>,
    /// Seed of the run's generator; entropy when `None`.
    pub seed: Option<u64>,
}

impl AlgorithmConfig {
    /// Sets the population size.
    #[must_use]
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = Some(size);
        self
    }

    /// Sets the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Builder returned by [`Optimizer::builder`].
pub struct OptimizerBuilder<A: Algorithm> {
    algorithm: A,
    population_size: Option<usize>,
    seed: Option<u64>,
    initialization: InitializationFn<A::Member>,
    callbacks: CallbackList,
}

impl<A: Algorithm> OptimizerBuilder<A> {
    /// Configures the number of members per generation.
    #[must_use]
    pub fn population_size(mut self, size: usize) -> Self {
        self.population_size = Some(size);
        self
    }

    /// Seeds the run's generator. Two optimizers built with the same seed and
    /// configuration produce identical runs.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replaces the population initializer.
    #[must_use]
    pub fn initialization(mut self, initialization: InitializationFn<A::Member>) -> Self {
        self.initialization = initialization;
        self
    }

    /// Registers a callback invoked around every iteration.
    #[must_use]
    pub fn callback(mut self, callback: impl Callback + 'static) -> Self {
        self.callbacks.push(callback);
        self
    }

    /// Applies the fields set in a shared configuration.
    #[must_use]
    pub fn config(mut self, config: &AlgorithmConfig) -> Self {
        if let Some(size) = config.population_size {
            self.population_size = Some(size);
        }
        if let Some(seed) = config.seed {
            self.seed = Some(seed);
        }
        self
    }

    /// Validates the configuration and builds the optimizer.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when a hyperparameter is out of range or the
    /// population size is zero or below the algorithm's minimum.
    pub fn build(self) -> Result<Optimizer<A>, ConfigError> {
        self.algorithm.validate()?;
        let population_size = match self.algorithm.fixed_population_size() {
            Some(size) => size,
            None => self
                .population_size
                .unwrap_or_else(|| self.algorithm.default_population_size()),
        };
        if population_size == 0 {
            return Err(ConfigError::ZeroPopulation);
        }
        let required = self.algorithm.min_population_size();
        if population_size < required {
            return Err(ConfigError::PopulationTooSmall {
                algorithm: self.algorithm.name(),
                required,
                found: population_size,
            });
        }
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Optimizer {
            algorithm: self.algorithm,
            population_size,
            seed: self.seed,
            rng,
            initialization: self.initialization,
            callbacks: self.callbacks,
            failure: None,
        })
    }
}

/// Runs an [`Algorithm`] against tasks.
///
/// The optimizer owns the seeded generator, so consecutive runs on the same
/// optimizer continue one random stream. Build a fresh optimizer per run for
/// independent, reproducible runs.
///
/// # Examples
/// ```
/// use swarmlab::{Benchmark, BenchmarkKind, Optimizer, Task};
/// use swarmlab::algorithms::ParticleSwarm;
///
/// let problem = Benchmark::new(BenchmarkKind::Sphere, 5).unwrap();
/// let mut task = Task::builder(problem).max_evals(200).build().unwrap();
/// let mut optimizer = Optimizer::builder(ParticleSwarm::default())
///     .population_size(10)
///     .seed(42)
///     .build()
///     .unwrap();
/// let outcome = optimizer.run(&mut task).unwrap();
/// assert_eq!(task.evals(), 200);
/// assert!(!optimizer.bad_run());
/// assert!(outcome.best_fitness >= 0.0);
/// ```
pub struct Optimizer<A: Algorithm> {
    algorithm: A,
    population_size: usize,
    seed: Option<u64>,
    rng: StdRng,
    initialization: InitializationFn<A::Member>,
    callbacks: CallbackList,
    failure: Option<OptimizeError>,
}

impl<A: Algorithm> Optimizer<A> {
    /// Creates a builder with the algorithm's defaults.
    #[must_use]
    pub fn builder(algorithm: A) -> OptimizerBuilder<A> {
        OptimizerBuilder {
            algorithm,
            population_size: None,
            seed: None,
            initialization: default_initialization::<A::Member>,
            callbacks: CallbackList::default(),
        }
    }

    /// Builds an optimizer with default settings.
    ///
    /// # Errors
    /// See [`OptimizerBuilder::build`].
    pub fn new(algorithm: A) -> Result<Self, ConfigError> {
        Self::builder(algorithm).build()
    }

    /// The wrapped algorithm.
    #[must_use]
    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }

    /// Effective population size.
    #[must_use]
    pub fn population_size(&self) -> usize {
        self.population_size
    }

    /// Configured seed, if any.
    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Algorithm hyperparameters plus the population size.
    #[must_use]
    pub fn parameters(&self) -> Parameters {
        let mut parameters = self.algorithm.parameters();
        #[allow(clippy::cast_precision_loss)]
        parameters.insert("population_size", self.population_size as f64);
        parameters
    }

    /// Whether the last run ended with an error.
    #[must_use]
    pub fn bad_run(&self) -> bool {
        self.failure.is_some()
    }

    /// Error that ended the last run, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&OptimizeError> {
        self.failure.as_ref()
    }

    /// Steps through a run one generation at a time.
    ///
    /// The first item describes the initial population; each further item
    /// follows one completed iteration. The iterator ends once the task's
    /// stopping condition holds, or right after the first error.
    ///
    /// # Examples
    /// ```
    /// use swarmlab::{Benchmark, BenchmarkKind, Optimizer, Task};
    /// use swarmlab::algorithms::GreyWolfOptimizer;
    ///
    /// let problem = Benchmark::new(BenchmarkKind::Rastrigin, 3).unwrap();
    /// let mut task = Task::builder(problem).max_iters(5).build().unwrap();
    /// let mut optimizer = Optimizer::builder(GreyWolfOptimizer::default())
    ///     .population_size(8)
    ///     .seed(1)
    ///     .build()
    ///     .unwrap();
    /// let reports: Vec<_> = optimizer.iterations(&mut task).collect::<Result<_, _>>().unwrap();
    /// assert_eq!(reports.len(), 6);
    /// assert_eq!(reports[5].iteration, 5);
    /// ```
    pub fn iterations<'a>(&'a mut self, task: &'a mut Task) -> Iterations<'a, A> {
        Iterations {
            optimizer: self,
            task,
            generation: None,
            finished: false,
        }
    }

    /// Runs the algorithm until the task stops.
    ///
    /// The returned best fitness is in user terms. On failure the error is
    /// both returned and kept for [`Self::bad_run`] / [`Self::failure`].
    ///
    /// # Errors
    /// Returns the first [`OptimizeError`] raised by the task or algorithm.
    pub fn run(&mut self, task: &mut Task) -> Result<RunOutcome, OptimizeError> {
        let span = info_span!("run", algorithm = self.algorithm.name());
        let _entered = span.enter();
        info!(
            problem = task.problem().name(),
            dimension = task.dimension(),
            population_size = self.population_size,
            seed = ?self.seed,
            "run started"
        );
        self.failure = None;
        match self.drive(task) {
            Ok(outcome) => {
                info!(
                    evals = outcome.evaluations,
                    iters = outcome.iterations,
                    best_fitness = outcome.best_fitness,
                    "run finished"
                );
                Ok(outcome)
            }
            Err(err) => {
                debug!(error = %err, evals = task.evals(), "run aborted");
                self.failure = Some(err.clone());
                Err(err)
            }
        }
    }

    fn drive(&mut self, task: &mut Task) -> Result<RunOutcome, OptimizeError> {
        let mut stats = RunStats::new();
        let mut iterations = self.iterations(task);
        for report in iterations.by_ref() {
            let report = report?;
            stats.push(
                report.best_fitness,
                report.mean_fitness,
                report.median_fitness,
                report.diversity,
            );
        }
        let best = iterations
            .into_generation()
            .map(|generation| generation.best)
            .unwrap_or_default();
        let sign = task.optimization_type().sign();
        let (best_x, best_fitness) = best.into_parts();
        Ok(RunOutcome {
            best_x,
            best_fitness: best_fitness * sign,
            evaluations: task.evals(),
            iterations: task.iters(),
            stats,
            convergence: task.convergence().clone(),
            metadata: RunMetadata {
                algorithm: self.algorithm.name().to_owned(),
                problem: task.problem().name().to_owned(),
                population_size: self.population_size,
                rng_seed: self.seed,
                rng_description: String::from("StdRng"),
            },
        })
    }
}

/// Summary of one generation, in user terms.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    /// Completed iterations (0 for the initial population).
    pub iteration: usize,
    /// Evaluations counted so far.
    pub evaluations: usize,
    /// Best-so-far position.
    pub best_x: Option<Vec<f64>>,
    /// Best-so-far objective value.
    pub best_fitness: f64,
    /// Mean objective value of the population.
    pub mean_fitness: f64,
    /// Median objective value of the population.
    pub median_fitness: f64,
    /// Diversity of the population positions.
    pub diversity: f64,
}

impl GenerationReport {
    fn capture<M: crate::core::Member, S>(
        iteration: usize,
        task: &Task,
        generation: &Generation<M, S>,
    ) -> Self {
        let sign = task.optimization_type().sign();
        Self {
            iteration,
            evaluations: task.evals(),
            best_x: generation.best.x().map(<[f64]>::to_vec),
            best_fitness: generation.best.fitness() * sign,
            mean_fitness: generation.population.mean_fitness() * sign,
            median_fitness: generation.population.median_fitness() * sign,
            diversity: generation.population.diversity(),
        }
    }
}

fn check_size(expected: usize, found: usize) -> Result<(), PopulationError> {
    if expected == found {
        Ok(())
    } else {
        Err(PopulationError::WrongSize { expected, found })
    }
}

/// Iterator returned by [`Optimizer::iterations`].
pub struct Iterations<'a, A: Algorithm> {
    optimizer: &'a mut Optimizer<A>,
    task: &'a mut Task,
    generation: Option<Generation<A::Member, A::State>>,
    finished: bool,
}

impl<'a, A: Algorithm> Iterations<'a, A> {
    /// The most recent generation, once the run has started.
    #[must_use]
    pub fn generation(&self) -> Option<&Generation<A::Member, A::State>> {
        self.generation.as_ref()
    }

    /// Consumes the iterator and returns the most recent generation.
    #[must_use]
    pub fn into_generation(self) -> Option<Generation<A::Member, A::State>> {
        self.generation
    }

    fn start(&mut self) -> Result<GenerationReport, OptimizeError> {
        let optimizer = &mut *self.optimizer;
        let mut setup = Setup::new(
            optimizer.population_size,
            &mut optimizer.rng,
            optimizer.initialization,
        );
        let (population, state) = optimizer.algorithm.init_population(self.task, &mut setup)?;
        check_size(optimizer.population_size, population.len())?;
        let best = get_best(&population, Best::unset());
        let generation = Generation {
            population,
            best,
            state,
        };
        let report = GenerationReport::capture(0, self.task, &generation);
        trace!(evals = report.evaluations, best = report.best_fitness, "population initialized");
        self.generation = Some(generation);
        Ok(report)
    }

    fn advance(
        &mut self,
        generation: Generation<A::Member, A::State>,
    ) -> Result<GenerationReport, OptimizeError> {
        let iteration = self.task.iters() + 1;
        let optimizer = &mut *self.optimizer;
        optimizer
            .callbacks
            .before_iteration(&IterationSnapshot::new(iteration, self.task, &generation));
        let previous = generation.best.clone();
        let Generation {
            population,
            best,
            state,
        } = optimizer
            .algorithm
            .run_iteration(self.task, generation, &mut optimizer.rng)?;
        check_size(optimizer.population_size, population.len())?;
        let best = get_best(&population, previous.merge(best));
        let generation = Generation {
            population,
            best,
            state,
        };
        self.task.next_iter();
        optimizer
            .callbacks
            .after_iteration(&IterationSnapshot::new(iteration, self.task, &generation));
        let report = GenerationReport::capture(iteration, self.task, &generation);
        trace!(
            iteration,
            evals = report.evaluations,
            best = report.best_fitness,
            "iteration complete"
        );
        self.generation = Some(generation);
        Ok(report)
    }
}

impl<'a, A: Algorithm> Iterator for Iterations<'a, A> {
    type Item = Result<GenerationReport, OptimizeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let step = match self.generation.take() {
            None => self.start(),
            Some(generation) => {
                if self.task.stopping_condition() {
                    self.generation = Some(generation);
                    self.finished = true;
                    return None;
                }
                self.advance(generation)
            }
        };
        if step.is_err() {
            self.finished = true;
        }
        Some(step)
    }
}

/// Object-safe view of an [`Optimizer`], used where the algorithm is chosen
/// at runtime.
pub trait Solver: Send {
    /// Canonical algorithm name.
    fn name(&self) -> &'static str;

    /// Effective population size.
    fn population_size(&self) -> usize;

    /// Configured seed, if any.
    fn seed(&self) -> Option<u64>;

    /// Hyperparameters including the population size.
    fn parameters(&self) -> Parameters;

    /// See [`Optimizer::run`].
    ///
    /// # Errors
    /// Returns the first [`OptimizeError`] raised during the run.
    fn run(&mut self, task: &mut Task) -> Result<RunOutcome, OptimizeError>;

    /// See [`Optimizer::bad_run`].
    fn bad_run(&self) -> bool;
}

impl<A> Solver for Optimizer<A>
where
    A: Algorithm + Send,
{
    fn name(&self) -> &'static str {
        self.algorithm.name()
    }

    fn population_size(&self) -> usize {
        self.population_size
    }

    fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn parameters(&self) -> Parameters {
        Optimizer::parameters(self)
    }

    fn run(&mut self, task: &mut Task) -> Result<RunOutcome, OptimizeError> {
        Optimizer::run(self, task)
    }

    fn bad_run(&self) -> bool {
        Optimizer::bad_run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::AlgorithmResult;
    use crate::core::Population;
    use crate::functions::{Benchmark, BenchmarkKind};

    /// Random search: redraws the whole population every iteration.
    #[derive(Default)]
    struct RandomSearch {
        fail_at: Option<usize>,
        shrink_at: Option<usize>,
    }

    impl Algorithm for RandomSearch {
        type Member = Vec<f64>;
        type State = usize;

        const NAMES: &'static [&'static str] = &["RandomSearch", "RS"];

        fn default_population_size(&self) -> usize {
            4
        }

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
            if Some(generation.state) == self.fail_at {
                return Err(OptimizeError::Algorithm {
                    algorithm: "RandomSearch",
                    message: String::from("planned failure"),
                });
            }
            let size = if Some(generation.state) == self.shrink_at {
                generation.population.len() - 1
            } else {
                generation.population.len()
            };
            let population = default_initialization(task, size, rng)?;
            let best = get_best(&population, generation.best);
            Ok(Generation {
                population,
                best,
                state: generation.state + 1,
            })
        }
    }

    fn task(max_evals: usize) -> Task {
        let problem = Benchmark::new(BenchmarkKind::Sphere, 2).unwrap();
        Task::builder(problem).max_evals(max_evals).build().unwrap()
    }

    #[test]
    fn budget_equal_to_population_stops_after_init() {
        let mut task = task(4);
        let mut optimizer = Optimizer::new(RandomSearch::default()).unwrap();
        let outcome = optimizer.run(&mut task).unwrap();
        assert_eq!(outcome.evaluations, 4);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.stats.generations(), 1);
    }

    #[test]
    fn best_sequence_never_worsens() {
        let mut task = task(200);
        let mut optimizer = Optimizer::builder(RandomSearch::default())
            .seed(3)
            .build()
            .unwrap();
        let reports: Vec<GenerationReport> = optimizer
            .iterations(&mut task)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(reports.len(), 50);
        for pair in reports.windows(2) {
            assert!(pair[1].best_fitness <= pair[0].best_fitness);
        }
    }

    #[test]
    fn failure_is_returned_and_recorded() {
        let mut task = task(100);
        let mut optimizer = Optimizer::builder(RandomSearch {
            fail_at: Some(2),
            ..RandomSearch::default()
        })
            .seed(1)
            .build()
            .unwrap();
        let err = optimizer.run(&mut task).unwrap_err();
        assert!(matches!(err, OptimizeError::Algorithm { .. }));
        assert!(optimizer.bad_run());
        assert_eq!(optimizer.failure(), Some(&err));
        assert_eq!(task.evals(), 12);
    }

    #[test]
    fn population_must_keep_its_size() {
        let mut task = task(100);
        let mut optimizer = Optimizer::builder(RandomSearch {
            shrink_at: Some(1),
            ..RandomSearch::default()
        })
        .seed(2)
        .build()
        .unwrap();
        let err = optimizer.run(&mut task).unwrap_err();
        assert_eq!(
            err,
            OptimizeError::Population(PopulationError::WrongSize {
                expected: 4,
                found: 3
            })
        );
        assert!(optimizer.bad_run());

        fn two_members(
            task: &mut Task,
            _size: usize,
            rng: &mut dyn rand::RngCore,
        ) -> crate::task::TaskResult<Population<Vec<f64>>> {
            default_initialization(task, 2, rng)
        }
        let mut task = self::task(100);
        let mut optimizer = Optimizer::builder(RandomSearch::default())
            .initialization(two_members)
            .build()
            .unwrap();
        assert_eq!(
            optimizer.run(&mut task).unwrap_err(),
            OptimizeError::Population(PopulationError::WrongSize {
                expected: 4,
                found: 2
            })
        );
    }

    #[test]
    fn population_size_validation() {
        assert!(matches!(
            Optimizer::builder(RandomSearch::default())
                .population_size(0)
                .build(),
            Err(ConfigError::ZeroPopulation)
        ));
        let optimizer = Optimizer::builder(RandomSearch::default())
            .config(&AlgorithmConfig::default().with_population_size(9))
            .build()
            .unwrap();
        assert_eq!(optimizer.population_size(), 9);
        assert_eq!(optimizer.parameters().get("population_size"), Some(&9.0));
        assert_eq!(optimizer.algorithm().name(), "RandomSearch");
    }

    #[test]
    fn seeded_runs_are_identical() {
        let run = || {
            let mut task = task(120);
            let mut optimizer = Optimizer::builder(RandomSearch::default())
                .seed(99)
                .build()
                .unwrap();
            optimizer.run(&mut task).unwrap()
        };
        let first = run();
        let second = run();
        assert_eq!(first.best_x, second.best_x);
        assert_eq!(first.stats, second.stats);
    }

    #[test]
    fn solver_is_object_safe() {
        let mut solver: Box<dyn Solver> = Box::new(
            Optimizer::builder(RandomSearch::default())
                .seed(5)
                .build()
                .unwrap(),
        );
        let mut task = task(40);
        let outcome = solver.run(&mut task).unwrap();
        assert_eq!(solver.name(), "RandomSearch");
        assert_eq!(solver.seed(), Some(5));
        assert_eq!(outcome.evaluations, 40);
        assert!(!solver.bad_run());
    }
}
