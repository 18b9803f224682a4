//! Name-based construction of algorithms and benchmark problems.
//!
//! Lookups ignore case, `_`, `-` and spaces, and accept both the long and
//! the short name of each entry (`"DifferentialEvolution"` or `"de"`).
//!
//! ```
//! use swarmlab::registry::{algorithm_by_name, problem_by_name, RegistryError};
//! use swarmlab::{AlgorithmConfig, Task};
//!
//! let config = AlgorithmConfig::default().with_population_size(10).with_seed(1);
//! let mut solver = algorithm_by_name("pso", &config).unwrap();
//! let problem = problem_by_name("rastrigin", 3).unwrap();
//! let mut task = Task::builder(problem).max_evals(100).build().unwrap();
//! solver.run(&mut task).unwrap();
//! assert_eq!(solver.name(), "ParticleSwarmAlgorithm");
//!
//! assert!(matches!(
//!     algorithm_by_name("nope", &config),
//!     Err(RegistryError::UnknownAlgorithm(_))
//! ));
//! ```

use crate::algorithm::{Algorithm, AlgorithmConfig, ConfigError, Optimizer, Solver};
use crate::algorithms::{
    BatAlgorithm, DifferentialEvolution, FireflyAlgorithm, GeneticAlgorithm, GreyWolfOptimizer,
    HillClimbing, ParticleSwarm, SimulatedAnnealing,
};
use crate::functions::{normalize_name, Benchmark, BenchmarkKind};
use crate::ops::ProblemError;
use thiserror::Error;

/// Lookup failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// No algorithm answers to the name.
    #[error("unknown algorithm `{0}`")]
    UnknownAlgorithm(String),
    /// No benchmark answers to the name.
    #[error("unknown problem `{0}`")]
    UnknownProblem(String),
    /// The algorithm rejected the configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The problem could not be built for the dimension.
    #[error(transparent)]
    Problem(#[from] ProblemError),
}

type Constructor = fn(&AlgorithmConfig) -> Result<Box<dyn Solver>, ConfigError>;

fn build<A>(config: &AlgorithmConfig) -> Result<Box<dyn Solver>, ConfigError>
where
    A: Algorithm + Default + Send + 'static,
{
    let optimizer = Optimizer::builder(A::default()).config(config).build()?;
    Ok(Box::new(optimizer))
}

fn entries() -> [(&'static [&'static str], Constructor); 8] {
    [
        (DifferentialEvolution::NAMES, build::<DifferentialEvolution>),
        (GeneticAlgorithm::NAMES, build::<GeneticAlgorithm>),
        (ParticleSwarm::NAMES, build::<ParticleSwarm>),
        (BatAlgorithm::NAMES, build::<BatAlgorithm>),
        (GreyWolfOptimizer::NAMES, build::<GreyWolfOptimizer>),
        (FireflyAlgorithm::NAMES, build::<FireflyAlgorithm>),
        (SimulatedAnnealing::NAMES, build::<SimulatedAnnealing>),
        (HillClimbing::NAMES, build::<HillClimbing>),
    ]
}

fn find(name: &str) -> Option<Constructor> {
    let wanted = normalize_name(name);
    entries().into_iter().find_map(|(names, constructor)| {
        names
            .iter()
            .any(|alias| normalize_name(alias) == wanted)
            .then_some(constructor)
    })
}

/// Canonical names of every registered algorithm.
#[must_use]
pub fn algorithm_names() -> Vec<&'static str> {
    entries().iter().map(|(names, _)| names[0]).collect()
}

/// Canonical names of every built-in benchmark.
#[must_use]
pub fn problem_names() -> Vec<&'static str> {
    BenchmarkKind::ALL.iter().map(|kind| kind.name()).collect()
}

/// Whether `name` resolves to a registered algorithm.
#[must_use]
pub fn is_algorithm(name: &str) -> bool {
    find(name).is_some()
}

/// Builds a default-configured optimizer for the named algorithm.
///
/// # Errors
/// [`RegistryError::UnknownAlgorithm`] for an unknown name, or
/// [`RegistryError::Config`] when the configuration is rejected.
pub fn algorithm_by_name(
    name: &str,
    config: &AlgorithmConfig,
) -> Result<Box<dyn Solver>, RegistryError> {
    let constructor = find(name).ok_or_else(|| RegistryError::UnknownAlgorithm(name.to_owned()))?;
    Ok(constructor(config)?)
}

/// Builds the named benchmark over its conventional domain.
///
/// # Errors
/// [`RegistryError::UnknownProblem`] for an unknown name, or
/// [`RegistryError::Problem`] for a zero dimension.
pub fn problem_by_name(name: &str, dimension: usize) -> Result<Benchmark, RegistryError> {
    let kind =
        BenchmarkKind::from_name(name).ok_or_else(|| RegistryError::UnknownProblem(name.to_owned()))?;
    Ok(Benchmark::new(kind, dimension)?)
}
