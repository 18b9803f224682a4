//! The algorithm contract and the driver that runs it.
//!
//! A concrete metaheuristic implements [`Algorithm`]: how to build the first
//! population and how to turn one [`Generation`] into the next. Everything
//! else (seeding, the iteration loop, best-so-far bookkeeping, callbacks,
//! failure capture) lives in [`Optimizer`].

pub mod callback;
pub mod optimizer;

use crate::core::{Best, Member, Population, PopulationError};
use crate::ops::{OperatorError, ProblemError};
use crate::task::{Task, TaskError, TaskResult};
use rand::rngs::StdRng;
use rand::RngCore;
use std::collections::BTreeMap;
use thiserror::Error;

pub use callback::{Callback, CallbackList, IterationSnapshot};
pub use optimizer::{AlgorithmConfig, GenerationReport, Iterations, Optimizer, OptimizerBuilder, Solver};

/// Named numeric hyperparameters, as reported by [`Algorithm::parameters`].
pub type Parameters = BTreeMap<&'static str, f64>;

/// Convenience alias for fallible algorithm hooks.
pub type AlgorithmResult<T> = Result<T, OptimizeError>;

/// Signature of a population initializer: draws and evaluates `size` members.
pub type InitializationFn<M> = fn(&mut Task, usize, &mut dyn RngCore) -> TaskResult<Population<M>>;

/// Errors found while validating an algorithm configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A population of zero members was requested.
    #[error("population size must be greater than zero")]
    ZeroPopulation,
    /// The algorithm needs more members than requested.
    #[error("{algorithm} needs a population of at least {required} (received {found})")]
    PopulationTooSmall {
        /// Algorithm name.
        algorithm: &'static str,
        /// Minimum accepted size.
        required: usize,
        /// Requested size.
        found: usize,
    },
    /// A hyperparameter is out of range.
    #[error("{algorithm} parameter `{parameter}` is invalid (received {value})")]
    InvalidParameter {
        /// Algorithm name.
        algorithm: &'static str,
        /// Parameter name.
        parameter: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// A variation operator rejected its configuration.
    #[error(transparent)]
    Operator(#[from] OperatorError),
}

/// Everything that can end a run early.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizeError {
    /// The task or its problem failed.
    #[error(transparent)]
    Task(#[from] TaskError),
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// An algorithm produced a misaligned population.
    #[error(transparent)]
    Population(#[from] PopulationError),
    /// An algorithm-specific failure.
    #[error("{algorithm} failed: {message}")]
    Algorithm {
        /// Algorithm name.
        algorithm: &'static str,
        /// Description of the failure.
        message: String,
    },
}

impl From<ProblemError> for OptimizeError {
    fn from(err: ProblemError) -> Self {
        Self::Task(TaskError::Problem(err))
    }
}

impl From<OperatorError> for OptimizeError {
    fn from(err: OperatorError) -> Self {
        Self::Config(ConfigError::Operator(err))
    }
}

/// One generation of a run: the population, the best-so-far and the
/// algorithm's own state.
#[derive(Debug, Clone)]
pub struct Generation<M, S> {
    /// Current population.
    pub population: Population<M>,
    /// Best-so-far, never worse than in any earlier generation.
    pub best: Best,
    /// Algorithm-specific state carried between iterations.
    pub state: S,
}

/// What [`Algorithm::init_population`] may use to build the first
/// population.
pub struct Setup<'a, M> {
    population_size: usize,
    rng: &'a mut StdRng,
    initialization: InitializationFn<M>,
}

impl<'a, M: Member> Setup<'a, M> {
    pub(crate) fn new(
        population_size: usize,
        rng: &'a mut StdRng,
        initialization: InitializationFn<M>,
    ) -> Self {
        Self {
            population_size,
            rng,
            initialization,
        }
    }

    /// Configured population size.
    #[must_use]
    pub fn population_size(&self) -> usize {
        self.population_size
    }

    /// The run's generator.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut *self.rng
    }

    /// Runs the configured initializer for the configured size.
    ///
    /// # Errors
    /// Propagates evaluation failures.
    pub fn initialize(&mut self, task: &mut Task) -> AlgorithmResult<Population<M>> {
        Ok((self.initialization)(task, self.population_size, &mut *self.rng)?)
    }
}

/// Default initializer: `size` uniformly drawn members, one evaluation each.
///
/// # Errors
/// Propagates evaluation failures.
pub fn default_initialization<M: Member>(
    task: &mut Task,
    size: usize,
    rng: &mut dyn RngCore,
) -> TaskResult<Population<M>> {
    let mut population = Population::with_capacity(size);
    for _ in 0..size {
        let (member, fitness) = M::random(task, rng)?;
        population.push(member, fitness);
    }
    Ok(population)
}

/// A population-based metaheuristic.
///
/// Implementations keep their hyperparameters in `self` and anything that
/// evolves during a run in [`Algorithm::State`]. Each hook receives the task
/// and must do all evaluation through it.
pub trait Algorithm {
    /// Member type stored in the population.
    type Member: Member;
    /// State carried from one iteration to the next.
    type State;

    /// Canonical name first, then aliases (e.g. `["DifferentialEvolution", "DE"]`).
    const NAMES: &'static [&'static str];

    /// Canonical name.
    fn name(&self) -> &'static str {
        Self::NAMES.first().copied().unwrap_or("Algorithm")
    }

    /// Population size used when the optimizer builder does not set one.
    fn default_population_size(&self) -> usize {
        50
    }

    /// Population size the algorithm insists on, overriding configuration.
    fn fixed_population_size(&self) -> Option<usize> {
        None
    }

    /// Smallest population the algorithm can work with.
    fn min_population_size(&self) -> usize {
        1
    }

    /// Numeric hyperparameters by name.
    fn parameters(&self) -> Parameters {
        Parameters::new()
    }

    /// Checks hyperparameters. Called once at build time.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidParameter`] for out-of-range values.
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Builds the first population and the initial state.
    ///
    /// # Errors
    /// Propagates evaluation failures.
    fn init_population(
        &mut self,
        task: &mut Task,
        setup: &mut Setup<'_, Self::Member>,
    ) -> AlgorithmResult<(Population<Self::Member>, Self::State)>;

    /// Produces the next generation. The returned best must come from
    /// [`crate::get_best`] or [`Best::challenge`].
    ///
    /// # Errors
    /// Propagates evaluation failures.
    fn run_iteration(
        &mut self,
        task: &mut Task,
        generation: Generation<Self::Member, Self::State>,
        rng: &mut StdRng,
    ) -> AlgorithmResult<Generation<Self::Member, Self::State>>;
}

pub(crate) fn ensure_positive(
    algorithm: &'static str,
    parameter: &'static str,
    value: f64,
) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            algorithm,
            parameter,
            value,
        })
    }
}

pub(crate) fn ensure_non_negative(
    algorithm: &'static str,
    parameter: &'static str,
    value: f64,
) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            algorithm,
            parameter,
            value,
        })
    }
}

pub(crate) fn ensure_probability(
    algorithm: &'static str,
    parameter: &'static str,
    value: f64,
) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            algorithm,
            parameter,
            value,
        })
    }
}
