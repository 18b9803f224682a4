//! Core entities shared by every algorithm.
//!
//! A run threads three things from one generation to the next: a
//! [`Population`] of members with an aligned fitness vector, the best-so-far
//! [`Best`], and whatever state the algorithm keeps. Members are either raw
//! position vectors (`Vec<f64>`) or [`Individual`] values that carry their
//! own cached fitness; the [`Member`] trait lets the framework treat both
//! alike.
//!
//! All fitness values in this module are direction adjusted: smaller is
//! always better, whatever the task's optimization type.

pub mod experiment;
pub mod population;

use crate::task::{Task, TaskResult};
use crate::util::uniform_vector;
use rand::RngCore;
use std::ops::{Index, IndexMut};

pub use experiment::{Convergence, RunMetadata, RunOutcome, RunStats};
pub use population::{Population, PopulationError};

/// A candidate solution together with its cached fitness.
///
/// A fresh individual has fitness `+inf` until it is evaluated. Cloning is a
/// deep copy and never re-evaluates.
///
/// # Examples
/// ```
/// use swarmlab::Individual;
/// let individual = Individual::new(vec![0.0, 1.0]);
/// assert_eq!(individual.x(), &[0.0, 1.0]);
/// assert!(individual.fitness().is_infinite());
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    x: Vec<f64>,
    f: f64,
}

impl Individual {
    /// Wraps a position vector. The fitness starts at `+inf`.
    #[must_use]
    pub fn new(x: Vec<f64>) -> Self {
        Self {
            x,
            f: f64::INFINITY,
        }
    }

    /// Creates an individual from a position and an already known fitness.
    ///
    /// # Examples
    /// ```
    /// use swarmlab::Individual;
    /// let individual = Individual::from_parts(vec![0.0], 1.5);
    /// assert_eq!(individual.fitness(), 1.5);
    /// ```
    #[must_use]
    pub fn from_parts(x: Vec<f64>, f: f64) -> Self {
        Self { x, f }
    }

    /// Draws a uniform position inside the task bounds and evaluates it.
    ///
    /// # Errors
    /// Propagates any [`crate::TaskError`] raised by the evaluation.
    pub fn random(task: &mut Task, rng: &mut dyn RngCore) -> TaskResult<Self> {
        let mut individual = Self::new(Vec::new());
        individual.generate_solution(task, rng);
        individual.evaluate(task, rng)?;
        Ok(individual)
    }

    /// Replaces the position with a uniform draw inside the task bounds.
    /// The cached fitness is reset to `+inf`.
    pub fn generate_solution(&mut self, task: &Task, rng: &mut dyn RngCore) {
        self.x = uniform_vector(task.lower(), task.upper(), rng);
        self.f = f64::INFINITY;
    }

    /// Repairs the position against the task bounds, then evaluates it.
    ///
    /// Repair always happens first so the cached fitness belongs to the
    /// stored position.
    ///
    /// # Errors
    /// Fails without touching the counters when the position has the wrong
    /// length, or with whatever the problem reports.
    ///
    /// # Examples
    /// ```
    /// use swarmlab::{Benchmark, BenchmarkKind, Individual, Task};
    /// use rand::SeedableRng;
    ///
    /// let problem = Benchmark::with_bounds(BenchmarkKind::Sphere, 2, &[-5.0], &[5.0]).unwrap();
    /// let mut task = Task::builder(problem).max_evals(10).build().unwrap();
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
    /// let mut individual = Individual::new(vec![10.0, -10.0]);
    /// individual.evaluate(&mut task, &mut rng).unwrap();
    /// assert_eq!(individual.x(), &[5.0, -5.0]);
    /// assert_eq!(individual.fitness(), 50.0);
    /// assert_eq!(task.evals(), 1);
    /// ```
    pub fn evaluate(&mut self, task: &mut Task, rng: &mut dyn RngCore) -> TaskResult<()> {
        task.repair_slice(&mut self.x, rng)?;
        self.f = task.eval(&self.x)?;
        Ok(())
    }

    /// Position vector.
    #[must_use]
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Cached, direction-adjusted fitness.
    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.f
    }

    /// Number of coordinates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether the position has no coordinates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Whether an equal individual (same position and fitness) is present in
    /// `others`.
    #[must_use]
    pub fn contained_in(&self, others: &[Individual]) -> bool {
        others.iter().any(|other| other == self)
    }
}

impl Index<usize> for Individual {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.x[index]
    }
}

impl IndexMut<usize> for Individual {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.x[index]
    }
}

/// Something that can live in a [`Population`].
///
/// Implemented for plain position vectors and for [`Individual`]. An
/// algorithm picks its member type through [`crate::Algorithm::Member`].
pub trait Member: Clone + std::fmt::Debug + Send {
    /// Position of the member in the search space.
    fn position(&self) -> &[f64];

    /// Draws and evaluates a uniformly random member, returning it with its
    /// fitness. Consumes exactly one evaluation unless the task has stopped.
    ///
    /// # Errors
    /// Propagates evaluation failures.
    fn random(task: &mut Task, rng: &mut dyn RngCore) -> TaskResult<(Self, f64)>;
}

impl Member for Vec<f64> {
    fn position(&self) -> &[f64] {
        self
    }

    fn random(task: &mut Task, rng: &mut dyn RngCore) -> TaskResult<(Self, f64)> {
        let x = uniform_vector(task.lower(), task.upper(), rng);
        let f = task.eval(&x)?;
        Ok((x, f))
    }
}

impl Member for Individual {
    fn position(&self) -> &[f64] {
        &self.x
    }

    fn random(task: &mut Task, rng: &mut dyn RngCore) -> TaskResult<(Self, f64)> {
        let individual = Individual::random(task, rng)?;
        let f = individual.fitness();
        Ok((individual, f))
    }
}

/// Best-so-far position and fitness.
///
/// Starts unset with fitness `+inf`. It is only ever replaced by a strictly
/// better candidate, so it never worsens over a run.
///
/// # Examples
/// ```
/// use swarmlab::Best;
/// let best = Best::unset().challenge(&[1.0], 3.0);
/// let best = best.challenge(&[2.0], 3.0);
/// assert_eq!(best.x(), Some(&[1.0][..]));
/// let best = best.challenge(&[0.5], f64::NAN);
/// assert_eq!(best.fitness(), 3.0);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Best {
    x: Option<Vec<f64>>,
    fitness: f64,
}

impl Default for Best {
    fn default() -> Self {
        Self::unset()
    }
}

impl Best {
    /// The state before any evaluation.
    #[must_use]
    pub fn unset() -> Self {
        Self {
            x: None,
            fitness: f64::INFINITY,
        }
    }

    /// Best position, if one has been recorded.
    #[must_use]
    pub fn x(&self) -> Option<&[f64]> {
        self.x.as_deref()
    }

    /// Direction-adjusted best fitness (`+inf` while unset).
    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Whether a position has been recorded.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.x.is_some()
    }

    /// Keeps the current best unless `fitness` is strictly smaller.
    #[must_use]
    pub fn challenge(self, x: &[f64], fitness: f64) -> Self {
        if fitness < self.fitness {
            Self {
                x: Some(x.to_vec()),
                fitness,
            }
        } else {
            self
        }
    }

    /// Keeps the current best unless `other` holds a strictly better one.
    #[must_use]
    pub fn merge(self, other: Best) -> Self {
        if other.x.is_some() && other.fitness < self.fitness {
            other
        } else {
            self
        }
    }

    /// Splits into position and direction-adjusted fitness.
    #[must_use]
    pub fn into_parts(self) -> (Option<Vec<f64>>, f64) {
        (self.x, self.fitness)
    }
}

/// Folds a population into the best-so-far.
///
/// The population's minimum replaces `best` only when strictly smaller, so a
/// tie keeps the incoming best and NaN fitness never wins. Every algorithm
/// routes its best updates through here (or through [`Best::challenge`] for a
/// single candidate).
///
/// # Examples
/// ```
/// use swarmlab::{get_best, Best, Population};
///
/// let population = Population::new(vec![vec![1.0], vec![2.0]], vec![4.0, 0.5]).unwrap();
/// let best = get_best(&population, Best::unset());
/// assert_eq!(best.x(), Some(&[2.0][..]));
/// assert_eq!(best.fitness(), 0.5);
///
/// let worse = Population::new(vec![vec![9.0]], vec![7.0]).unwrap();
/// assert_eq!(get_best(&worse, best.clone()), best);
/// ```
#[must_use]
pub fn get_best<M: Member>(population: &Population<M>, best: Best) -> Best {
    match population.best_index() {
        Some(idx) => best.challenge(population.member(idx).position(), population.fitness()[idx]),
        None => best,
    }
}
