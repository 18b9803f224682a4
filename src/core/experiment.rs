//! Run results and time-series analytics.
//!
//! Values stored here are in user terms: a maximisation run reports the
//! objective it actually reached, not the negated internal value.

/// Per-generation metrics captured during a run.
///
/// Entry 0 describes the initial population; entry `k` the population after
/// iteration `k`.
///
/// # Examples
/// ```
/// use swarmlab::RunStats;
/// let stats = RunStats::new();
/// assert_eq!(stats.generations(), 0);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    /// Best-so-far fitness after each generation.
    pub best_fitness: Vec<f64>,
    /// Mean fitness of the population per generation.
    pub mean_fitness: Vec<f64>,
    /// Median fitness of the population per generation.
    pub median_fitness: Vec<f64>,
    /// Diversity score of the population per generation.
    pub population_diversity: Vec<f64>,
}

impl RunStats {
    /// Creates an empty set of run statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one generation.
    pub fn push(&mut self, best: f64, mean: f64, median: f64, diversity: f64) {
        self.best_fitness.push(best);
        self.mean_fitness.push(mean);
        self.median_fitness.push(median);
        self.population_diversity.push(diversity);
    }

    /// Returns the number of generations tracked.
    #[must_use]
    pub fn generations(&self) -> usize {
        self.best_fitness.len()
    }
}

/// Improvement log of a task: one point each time the best-so-far improved.
///
/// # Examples
/// ```
/// use swarmlab::Convergence;
/// let mut log = Convergence::default();
/// log.record(1, 9.0);
/// log.record(4, 2.0);
/// assert_eq!(
///     log.dense(),
///     vec![(1, 9.0), (2, 9.0), (3, 9.0), (4, 2.0)]
/// );
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Convergence {
    evaluations: Vec<usize>,
    fitness: Vec<f64>,
}

impl Convergence {
    /// Adds an improvement observed at evaluation number `evaluation`.
    pub fn record(&mut self, evaluation: usize, fitness: f64) {
        self.evaluations.push(evaluation);
        self.fitness.push(fitness);
    }

    /// Evaluation counts at which the best improved.
    #[must_use]
    pub fn evaluations(&self) -> &[usize] {
        &self.evaluations
    }

    /// Best fitness after each improvement, in user terms.
    #[must_use]
    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    /// Number of recorded improvements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.evaluations.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.evaluations.is_empty()
    }

    /// Expands the log to one `(evaluation, best)` point per evaluation, from
    /// the first improvement up to the last one.
    #[must_use]
    pub fn dense(&self) -> Vec<(usize, f64)> {
        let mut points = Vec::new();
        for (idx, (&evaluation, &fitness)) in self.evaluations.iter().zip(&self.fitness).enumerate() {
            let until = self
                .evaluations
                .get(idx + 1)
                .copied()
                .unwrap_or(evaluation + 1);
            points.extend((evaluation..until).map(|at| (at, fitness)));
        }
        points
    }
}

/// Context recorded alongside a run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetadata {
    /// Canonical algorithm name.
    pub algorithm: String,
    /// Problem name reported by the task.
    pub problem: String,
    /// Population size used.
    pub population_size: usize,
    /// Seed of the run, when one was configured.
    pub rng_seed: Option<u64>,
    /// Human readable description of the RNG.
    pub rng_description: String,
}

/// Everything a finished run reports.
///
/// # Examples
/// ```
/// use swarmlab::{Benchmark, BenchmarkKind, Optimizer, Task};
/// use swarmlab::algorithms::DifferentialEvolution;
///
/// let problem = Benchmark::new(BenchmarkKind::Sphere, 3).unwrap();
/// let mut task = Task::builder(problem).max_evals(300).build().unwrap();
/// let mut optimizer = Optimizer::builder(DifferentialEvolution::default())
///     .population_size(10)
///     .seed(5)
///     .build()
///     .unwrap();
/// let outcome = optimizer.run(&mut task).unwrap();
/// let (best_x, best_fitness) = outcome.best();
/// assert_eq!(best_x.map(<[f64]>::len), Some(3));
/// assert!(best_fitness.is_finite());
/// assert_eq!(outcome.evaluations, 300);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// Best position found, `None` when nothing was evaluated.
    pub best_x: Option<Vec<f64>>,
    /// Best fitness in user terms.
    pub best_fitness: f64,
    /// Evaluations consumed.
    pub evaluations: usize,
    /// Iterations completed.
    pub iterations: usize,
    /// Per-generation statistics.
    pub stats: RunStats,
    /// Improvement log of the task.
    pub convergence: Convergence,
    /// Run context.
    pub metadata: RunMetadata,
}

impl RunOutcome {
    /// Best position and fitness.
    #[must_use]
    pub fn best(&self) -> (Option<&[f64]>, f64) {
        (self.best_x.as_deref(), self.best_fitness)
    }
}

pub(crate) fn population_diversity_by<'a, F>(size: usize, mut at: F) -> f64
where
    F: FnMut(usize) -> &'a [f64],
{
    if size == 0 {
        return 0.0;
    }
    let dimensions = at(0).len();
    if dimensions == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = size as f64;
    let mut means = vec![0.0; dimensions];
    for idx in 0..size {
        for (mean, value) in means.iter_mut().zip(at(idx)) {
            *mean += value / count;
        }
    }
    let mut total_variance = 0.0;
    for idx in 0..size {
        for (mean, value) in means.iter().zip(at(idx)) {
            total_variance += (value - mean) * (value - mean) / count;
        }
    }
    #[allow(clippy::cast_precision_loss)]
    {
        (total_variance / dimensions as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_expansion_fills_gaps() {
        let mut log = Convergence::default();
        assert!(log.dense().is_empty());
        log.record(1, 5.0);
        log.record(2, 4.0);
        log.record(5, 1.0);
        let dense = log.dense();
        assert_eq!(dense.len(), 5);
        assert_eq!(dense[2], (3, 4.0));
        assert_eq!(dense.last(), Some(&(5, 1.0)));
    }

    #[test]
    fn stats_push_keeps_series_aligned() {
        let mut stats = RunStats::new();
        stats.push(1.0, 2.0, 1.5, 0.3);
        stats.push(0.5, 1.0, 0.8, 0.2);
        assert_eq!(stats.generations(), 2);
        assert_eq!(stats.population_diversity, vec![0.3, 0.2]);
    }

    #[test]
    fn diversity_of_spread_points() {
        let points = [vec![-1.0], vec![1.0]];
        let diversity = population_diversity_by(points.len(), |idx| points[idx].as_slice());
        assert!((diversity - 1.0).abs() < 1e-12);
    }
}
