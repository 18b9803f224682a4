//! Optimization tasks: a problem, a direction, a repair strategy and a budget.
//!
//! [`Task`] is the only way algorithms touch the objective. It counts every
//! evaluation and iteration, keeps the best value it has seen and decides when
//! the run is over. Values handed to algorithms are direction adjusted
//! (smaller is better); [`Task::best_fitness`] and the convergence log report
//! user-facing values.

use crate::core::Convergence;
use crate::ops::{validate_bound_arrays, Limit, Problem, ProblemError, RepairOperator};
use crate::util::full_array;
use rand::RngCore;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Convenience alias for task operations.
pub type TaskResult<T> = Result<T, TaskError>;

/// Errors raised by a [`Task`] or its builder.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskError {
    /// The problem rejected a candidate or its bounds.
    #[error(transparent)]
    Problem(#[from] ProblemError),
    /// A bound override was given as an empty list.
    #[error("bound overrides must contain at least one value")]
    EmptyBounds,
}

/// Whether the objective is minimised or maximised.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizationType {
    /// Smaller objective values are better.
    #[default]
    Minimization,
    /// Larger objective values are better.
    Maximization,
}

impl OptimizationType {
    /// Multiplier that turns objective values into "smaller is better" fitness.
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            Self::Minimization => 1.0,
            Self::Maximization => -1.0,
        }
    }
}

/// Combines primitive stop conditions.
///
/// # Examples
/// ```
/// use swarmlab::{OptimizationType, StopCondition};
///
/// let condition = StopCondition::max_evaluations(100).or(StopCondition::target_fitness(1e-6));
/// assert_eq!(condition.evaluation_limit(), Some(100));
/// assert!(condition.is_met(100, 0, f64::INFINITY, OptimizationType::Minimization));
/// assert!(condition.is_met(3, 0, 0.0, OptimizationType::Minimization));
/// assert!(!condition.is_met(3, 0, 0.5, OptimizationType::Minimization));
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StopCondition {
    /// Never stops on its own.
    #[default]
    Unbounded,
    /// Stop once this many evaluations have been counted.
    MaxEvaluations {
        /// Evaluation budget.
        limit: usize,
    },
    /// Stop once this many iterations have completed.
    MaxIterations {
        /// Iteration budget.
        limit: usize,
    },
    /// Stop once the best value reaches or passes this objective value.
    TargetFitness {
        /// Target in user terms.
        value: f64,
    },
    /// Logical OR that triggers when either child condition is met.
    Or(Box<StopCondition>, Box<StopCondition>),
}

impl StopCondition {
    /// Evaluation budget.
    #[must_use]
    pub fn max_evaluations(limit: usize) -> Self {
        Self::MaxEvaluations { limit }
    }

    /// Iteration budget.
    #[must_use]
    pub fn max_iterations(limit: usize) -> Self {
        Self::MaxIterations { limit }
    }

    /// Target objective value in user terms.
    #[must_use]
    pub fn target_fitness(value: f64) -> Self {
        Self::TargetFitness { value }
    }

    /// Combines two stop conditions using logical OR semantics.
    #[must_use]
    pub fn or(self, other: StopCondition) -> Self {
        match (self, other) {
            (Self::Unbounded, condition) | (condition, Self::Unbounded) => condition,
            (left, right) => Self::Or(Box::new(left), Box::new(right)),
        }
    }

    /// Whether the condition holds for the given counters and internal best.
    #[must_use]
    pub fn is_met(
        &self,
        evals: usize,
        iters: usize,
        best_internal: f64,
        direction: OptimizationType,
    ) -> bool {
        match self {
            Self::Unbounded => false,
            Self::MaxEvaluations { limit } => evals >= *limit,
            Self::MaxIterations { limit } => iters >= *limit,
            Self::TargetFitness { value } => best_internal <= value * direction.sign(),
            Self::Or(left, right) => {
                left.is_met(evals, iters, best_internal, direction)
                    || right.is_met(evals, iters, best_internal, direction)
            }
        }
    }

    /// Tightest evaluation budget in the condition.
    #[must_use]
    pub fn evaluation_limit(&self) -> Option<usize> {
        match self {
            Self::MaxEvaluations { limit } => Some(*limit),
            Self::Or(left, right) => tightest(left.evaluation_limit(), right.evaluation_limit()),
            _ => None,
        }
    }

    /// Tightest iteration budget in the condition.
    #[must_use]
    pub fn iteration_limit(&self) -> Option<usize> {
        match self {
            Self::MaxIterations { limit } => Some(*limit),
            Self::Or(left, right) => tightest(left.iteration_limit(), right.iteration_limit()),
            _ => None,
        }
    }

    /// Target value in user terms, if any. With several targets, the one
    /// reached first under `direction` is returned: the largest when
    /// minimising, the smallest when maximising.
    #[must_use]
    pub fn target(&self, direction: OptimizationType) -> Option<f64> {
        match self {
            Self::TargetFitness { value } => Some(*value),
            Self::Or(left, right) => match (left.target(direction), right.target(direction)) {
                (Some(a), Some(b)) => {
                    let sign = direction.sign();
                    Some(if a * sign >= b * sign { a } else { b })
                }
                (a, b) => a.or(b),
            },
            _ => None,
        }
    }
}

fn tightest(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Builder returned by [`Task::builder`].
pub struct TaskBuilder {
    problem: Arc<dyn Problem>,
    optimization_type: OptimizationType,
    repair: Arc<dyn RepairOperator>,
    stop_condition: StopCondition,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
}

impl TaskBuilder {
    /// Minimise or maximise the objective. Defaults to minimisation.
    #[must_use]
    pub fn optimization_type(mut self, optimization_type: OptimizationType) -> Self {
        self.optimization_type = optimization_type;
        self
    }

    /// Shorthand for [`OptimizationType::Maximization`].
    #[must_use]
    pub fn maximize(self) -> Self {
        self.optimization_type(OptimizationType::Maximization)
    }

    /// Adds an evaluation budget.
    #[must_use]
    pub fn max_evals(mut self, limit: usize) -> Self {
        self.stop_condition = self.stop_condition.or(StopCondition::max_evaluations(limit));
        self
    }

    /// Adds an iteration budget.
    #[must_use]
    pub fn max_iters(mut self, limit: usize) -> Self {
        self.stop_condition = self.stop_condition.or(StopCondition::max_iterations(limit));
        self
    }

    /// Adds a target objective value, given in user terms.
    #[must_use]
    pub fn target_fitness(mut self, value: f64) -> Self {
        self.stop_condition = self.stop_condition.or(StopCondition::target_fitness(value));
        self
    }

    /// Adds an arbitrary stop condition.
    #[must_use]
    pub fn stop_condition(mut self, condition: StopCondition) -> Self {
        self.stop_condition = self.stop_condition.or(condition);
        self
    }

    /// Replaces the repair strategy. Defaults to [`Limit`].
    #[must_use]
    pub fn repair(mut self, repair: impl RepairOperator + 'static) -> Self {
        self.repair = Arc::new(repair);
        self
    }

    /// Narrows or replaces the problem's bounds. Each list is tiled to the
    /// problem dimension, so a single value applies to every coordinate.
    #[must_use]
    pub fn bounds(mut self, lower: &[f64], upper: &[f64]) -> Self {
        self.lower = Some(lower.to_vec());
        self.upper = Some(upper.to_vec());
        self
    }

    /// Validates the configuration and builds the task.
    ///
    /// # Errors
    /// Returns [`TaskError::EmptyBounds`] for an empty override, or the
    /// problem's own bound validation error.
    pub fn build(self) -> TaskResult<Task> {
        self.problem.validate_bounds()?;
        let dimension = self.problem.dimensions();
        let lower = match self.lower {
            Some(values) => full_array(&values, dimension).ok_or(TaskError::EmptyBounds)?,
            None => self.problem.lower_bounds().to_vec(),
        };
        let upper = match self.upper {
            Some(values) => full_array(&values, dimension).ok_or(TaskError::EmptyBounds)?,
            None => self.problem.upper_bounds().to_vec(),
        };
        validate_bound_arrays(dimension, &lower, &upper)?;
        let range = upper.iter().zip(&lower).map(|(u, l)| u - l).collect();
        Ok(Task {
            problem: self.problem,
            lower,
            upper,
            range,
            optimization_type: self.optimization_type,
            repair: self.repair,
            stop_condition: self.stop_condition,
            evals: 0,
            iters: 0,
            best_internal: f64::INFINITY,
            convergence: Convergence::default(),
        })
    }
}

/// A problem bound to a direction, repair strategy and stopping budget.
///
/// # Examples
/// ```
/// use swarmlab::{Benchmark, BenchmarkKind, Task};
///
/// let problem = Benchmark::new(BenchmarkKind::Sphere, 2).unwrap();
/// let mut task = Task::builder(problem).max_evals(2).build().unwrap();
/// assert_eq!(task.eval(&[1.0, 1.0]).unwrap(), 2.0);
/// assert_eq!(task.eval(&[0.5, 0.0]).unwrap(), 0.25);
/// assert!(task.stopping_condition());
/// // Once stopped, evaluations are refused without being counted.
/// assert_eq!(task.eval(&[0.0, 0.0]).unwrap(), f64::INFINITY);
/// assert_eq!(task.evals(), 2);
/// assert_eq!(task.best_fitness(), Some(0.25));
/// ```
pub struct Task {
    problem: Arc<dyn Problem>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    range: Vec<f64>,
    optimization_type: OptimizationType,
    repair: Arc<dyn RepairOperator>,
    stop_condition: StopCondition,
    evals: usize,
    iters: usize,
    best_internal: f64,
    convergence: Convergence,
}

impl Task {
    /// Starts configuring a task around a problem.
    #[must_use]
    pub fn builder(problem: impl Problem + 'static) -> TaskBuilder {
        Self::shared(Arc::new(problem))
    }

    /// Starts configuring a task around a problem shared with other tasks.
    #[must_use]
    pub fn shared(problem: Arc<dyn Problem>) -> TaskBuilder {
        TaskBuilder {
            problem,
            optimization_type: OptimizationType::Minimization,
            repair: Arc::new(Limit),
            stop_condition: StopCondition::Unbounded,
            lower: None,
            upper: None,
        }
    }

    /// Evaluates `x` and returns its direction-adjusted fitness.
    ///
    /// Once the stopping condition holds, returns `+inf` without calling the
    /// problem and without counting. A candidate of the wrong length fails
    /// before anything is counted.
    ///
    /// # Errors
    /// Returns [`TaskError::Problem`] on a dimension mismatch or a failing
    /// objective.
    pub fn eval(&mut self, x: &[f64]) -> TaskResult<f64> {
        self.problem.validate_candidate_length(x.len())?;
        if self.stopping_condition() {
            return Ok(f64::INFINITY);
        }
        let raw = self.problem.evaluate(x)?;
        self.evals += 1;
        let fitness = raw * self.optimization_type.sign();
        if fitness < self.best_internal {
            self.best_internal = fitness;
            self.convergence.record(self.evals, raw);
            debug!(evals = self.evals, fitness = raw, "best-so-far improved");
        }
        Ok(fitness)
    }

    /// Repairs an owned vector and hands it back.
    ///
    /// # Errors
    /// Returns a dimension mismatch when `x` has the wrong length.
    pub fn repair(&self, mut x: Vec<f64>, rng: &mut dyn RngCore) -> TaskResult<Vec<f64>> {
        self.repair_slice(&mut x, rng)?;
        Ok(x)
    }

    /// Repairs `x` in place.
    ///
    /// # Errors
    /// Returns a dimension mismatch when `x` has the wrong length.
    pub fn repair_slice(&self, x: &mut [f64], rng: &mut dyn RngCore) -> TaskResult<()> {
        self.problem.validate_candidate_length(x.len())?;
        self.repair.repair(x, &self.lower, &self.upper, rng);
        Ok(())
    }

    /// Marks the end of one iteration.
    pub fn next_iter(&mut self) {
        self.iters += 1;
    }

    /// Whether any configured budget is exhausted or the target was reached.
    #[must_use]
    pub fn stopping_condition(&self) -> bool {
        self.stop_condition.is_met(
            self.evals,
            self.iters,
            self.best_internal,
            self.optimization_type,
        )
    }

    /// Whether every coordinate of `x` lies within the bounds.
    #[must_use]
    pub fn is_feasible(&self, x: &[f64]) -> bool {
        x.len() == self.dimension()
            && x
                .iter()
                .zip(self.lower.iter().zip(&self.upper))
                .all(|(value, (low, high))| low <= value && value <= high)
    }

    /// Fraction of the tightest budget already used, in `[0, 1]`. `0.0` when
    /// no evaluation or iteration budget is configured.
    #[must_use]
    pub fn progress(&self) -> f64 {
        let ratio = |used: usize, limit: usize| {
            if limit == 0 {
                1.0
            } else {
                #[allow(clippy::cast_precision_loss)]
                let value = used as f64 / limit as f64;
                value.min(1.0)
            }
        };
        let evals = self
            .stop_condition
            .evaluation_limit()
            .map(|limit| ratio(self.evals, limit));
        let iters = self
            .stop_condition
            .iteration_limit()
            .map(|limit| ratio(self.iters, limit));
        match (evals, iters) {
            (Some(a), Some(b)) => a.max(b),
            (a, b) => a.or(b).unwrap_or(0.0),
        }
    }

    /// Number of counted evaluations.
    #[must_use]
    pub fn evals(&self) -> usize {
        self.evals
    }

    /// Number of completed iterations.
    #[must_use]
    pub fn iters(&self) -> usize {
        self.iters
    }

    /// Evaluation budget, if any.
    #[must_use]
    pub fn max_evals(&self) -> Option<usize> {
        self.stop_condition.evaluation_limit()
    }

    /// Iteration budget, if any.
    #[must_use]
    pub fn max_iters(&self) -> Option<usize> {
        self.stop_condition.iteration_limit()
    }

    /// The configured stop condition.
    #[must_use]
    pub fn stop_condition(&self) -> &StopCondition {
        &self.stop_condition
    }

    /// Best objective value seen so far, in user terms.
    #[must_use]
    pub fn best_fitness(&self) -> Option<f64> {
        self.convergence.fitness().last().copied()
    }

    /// Improvement log in user terms.
    #[must_use]
    pub fn convergence(&self) -> &Convergence {
        &self.convergence
    }

    /// Number of decision variables.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    /// Lower bounds.
    #[must_use]
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Upper bounds.
    #[must_use]
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// `upper - lower`, per coordinate.
    #[must_use]
    pub fn range(&self) -> &[f64] {
        &self.range
    }

    /// Direction of the optimization.
    #[must_use]
    pub fn optimization_type(&self) -> OptimizationType {
        self.optimization_type
    }

    /// The wrapped problem.
    #[must_use]
    pub fn problem(&self) -> &dyn Problem {
        self.problem.as_ref()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("problem", &self.problem.name())
            .field("dimension", &self.dimension())
            .field("optimization_type", &self.optimization_type)
            .field("stop_condition", &self.stop_condition)
            .field("evals", &self.evals)
            .field("iters", &self.iters)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{Benchmark, BenchmarkKind};
    use crate::ops::{FnProblem, Reflect};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sphere(dimension: usize) -> Benchmark {
        Benchmark::with_bounds(BenchmarkKind::Sphere, dimension, &[-5.0], &[5.0]).unwrap()
    }

    #[test]
    fn counts_exactly_the_budget() {
        let mut task = Task::builder(sphere(2)).max_evals(3).build().unwrap();
        for _ in 0..10 {
            task.eval(&[1.0, 1.0]).unwrap();
        }
        assert_eq!(task.evals(), 3);
    }

    #[test]
    fn wrong_length_fails_without_counting() {
        let mut task = Task::builder(sphere(3)).max_evals(10).build().unwrap();
        let err = task.eval(&[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            TaskError::Problem(ProblemError::DimensionMismatch {
                expected: 3,
                found: 2
            })
        );
        assert_eq!(task.evals(), 0);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(task.repair(vec![0.0; 4], &mut rng).is_err());
    }

    #[test]
    fn stopping_condition_is_idempotent() {
        let mut task = Task::builder(sphere(1)).max_iters(2).build().unwrap();
        task.next_iter();
        assert!(!task.stopping_condition());
        assert!(!task.stopping_condition());
        task.next_iter();
        assert!(task.stopping_condition());
        assert!(task.stopping_condition());
        assert_eq!(task.iters(), 2);
    }

    #[test]
    fn maximisation_flips_sign_and_target() {
        let problem = FnProblem::new(vec![0.0], vec![10.0], |x: &[f64]| x[0]).unwrap();
        let mut task = Task::builder(problem)
            .maximize()
            .target_fitness(8.0)
            .build()
            .unwrap();
        assert_eq!(task.eval(&[3.0]).unwrap(), -3.0);
        assert!(!task.stopping_condition());
        assert_eq!(task.eval(&[9.0]).unwrap(), -9.0);
        assert!(task.stopping_condition());
        assert_eq!(task.best_fitness(), Some(9.0));
    }

    #[test]
    fn target_is_reached_on_equality() {
        let problem = FnProblem::new(vec![0.0], vec![1.0], |_: &[f64]| 0.5).unwrap();
        let mut task = Task::builder(problem).target_fitness(0.5).build().unwrap();
        assert!(!task.stopping_condition());
        task.eval(&[0.2]).unwrap();
        assert!(task.stopping_condition());
    }

    #[test]
    fn unbounded_task_never_stops() {
        let mut task = Task::builder(sphere(1)).build().unwrap();
        for _ in 0..100 {
            task.eval(&[0.0]).unwrap();
            task.next_iter();
        }
        assert!(!task.stopping_condition());
        assert_eq!(task.progress(), 0.0);
    }

    #[test]
    fn combined_budgets_stop_on_the_first() {
        let mut task = Task::builder(sphere(1))
            .max_evals(100)
            .max_iters(2)
            .build()
            .unwrap();
        task.eval(&[1.0]).unwrap();
        task.next_iter();
        assert!((task.progress() - 0.5).abs() < 1e-12);
        task.next_iter();
        assert!(task.stopping_condition());
        assert_eq!(task.max_evals(), Some(100));
        assert_eq!(task.max_iters(), Some(2));
    }

    #[test]
    fn reported_target_is_the_one_reached_first() {
        let condition = StopCondition::target_fitness(0.1)
            .or(StopCondition::max_evaluations(10))
            .or(StopCondition::target_fitness(1.0));
        let min = OptimizationType::Minimization;
        let max = OptimizationType::Maximization;
        assert_eq!(condition.target(min), Some(1.0));
        assert!(condition.is_met(0, 0, 1.0, min));
        assert_eq!(condition.target(max), Some(0.1));
        assert!(condition.is_met(0, 0, -0.1, max));
        assert!(!condition.is_met(0, 0, -0.05, max));
        assert_eq!(StopCondition::max_iterations(3).target(min), None);
    }

    #[test]
    fn repair_uses_configured_strategy() {
        let mut rng = StdRng::seed_from_u64(0);
        let task = Task::builder(sphere(2)).build().unwrap();
        assert_eq!(
            task.repair(vec![10.0, -10.0], &mut rng).unwrap(),
            vec![5.0, -5.0]
        );
        let task = Task::builder(sphere(1)).repair(Reflect).build().unwrap();
        let repaired = task.repair(vec![7.0], &mut rng).unwrap();
        assert!(task.is_feasible(&repaired));
    }

    #[test]
    fn bound_overrides_are_tiled_and_validated() {
        let task = Task::builder(sphere(3))
            .bounds(&[-1.0], &[1.0, 2.0])
            .build()
            .unwrap();
        assert_eq!(task.lower(), &[-1.0, -1.0, -1.0]);
        assert_eq!(task.upper(), &[1.0, 2.0, 1.0]);
        assert_eq!(task.range(), &[2.0, 3.0, 2.0]);
        assert!(matches!(
            Task::builder(sphere(2)).bounds(&[], &[1.0]).build(),
            Err(TaskError::EmptyBounds)
        ));
        assert!(matches!(
            Task::builder(sphere(2)).bounds(&[2.0], &[1.0]).build(),
            Err(TaskError::Problem(ProblemError::InvalidRange { .. }))
        ));
    }

    #[test]
    fn convergence_records_improvements_only() {
        let mut task = Task::builder(sphere(1)).build().unwrap();
        for value in [3.0, 4.0, 1.0, 2.0, 0.5] {
            task.eval(&[value]).unwrap();
        }
        assert_eq!(task.convergence().evaluations(), &[1, 3, 5]);
        assert_eq!(task.convergence().fitness(), &[9.0, 1.0, 0.25]);
    }
}
