//! Hooks invoked around every iteration of a run.

use crate::algorithm::Generation;
use crate::core::Best;
use crate::task::{OptimizationType, Task};

/// Read-only view of a run handed to callbacks.
#[derive(Debug, Clone, Copy)]
pub struct IterationSnapshot<'a> {
    /// Iteration about to run (in `before_iteration`) or just completed (in
    /// `after_iteration`), counting from 1.
    pub iteration: usize,
    /// Evaluations counted so far.
    pub evaluations: usize,
    /// Direction-adjusted fitness of the current population.
    pub fitness: &'a [f64],
    /// Best-so-far, direction adjusted.
    pub best: &'a Best,
    /// Direction of the task.
    pub optimization_type: OptimizationType,
}

impl<'a> IterationSnapshot<'a> {
    pub(crate) fn new<M, S>(iteration: usize, task: &Task, generation: &'a Generation<M, S>) -> Self {
        Self {
            iteration,
            evaluations: task.evals(),
            fitness: generation.population.fitness(),
            best: &generation.best,
            optimization_type: task.optimization_type(),
        }
    }

    /// Best-so-far objective value in user terms.
    #[must_use]
    pub fn best_fitness(&self) -> f64 {
        self.best.fitness() * self.optimization_type.sign()
    }
}

/// Observer of a run. Both hooks default to doing nothing.
///
/// # Examples
/// ```
/// use std::sync::{Arc, Mutex};
/// use swarmlab::{Benchmark, BenchmarkKind, Callback, IterationSnapshot, Optimizer, Task};
/// use swarmlab::algorithms::HillClimbing;
///
/// struct Trace(Arc<Mutex<Vec<f64>>>);
///
/// impl Callback for Trace {
///     fn after_iteration(&mut self, snapshot: &IterationSnapshot<'_>) {
///         self.0.lock().unwrap().push(snapshot.best_fitness());
///     }
/// }
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let problem = Benchmark::new(BenchmarkKind::Sphere, 2).unwrap();
/// let mut task = Task::builder(problem).max_iters(3).build().unwrap();
/// let mut optimizer = Optimizer::builder(HillClimbing::default())
///     .seed(2)
///     .callback(Trace(Arc::clone(&seen)))
///     .build()
///     .unwrap();
/// optimizer.run(&mut task).unwrap();
/// assert_eq!(seen.lock().unwrap().len(), 3);
/// ```
pub trait Callback: Send {
    /// Called before each iteration with the generation entering it.
    fn before_iteration(&mut self, _snapshot: &IterationSnapshot<'_>) {}

    /// Called after each iteration with the generation it produced.
    fn after_iteration(&mut self, _snapshot: &IterationSnapshot<'_>) {}
}

/// Runs several callbacks in registration order.
#[derive(Default)]
pub struct CallbackList {
    callbacks: Vec<Box<dyn Callback>>,
}

impl CallbackList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a callback.
    pub fn push(&mut self, callback: impl Callback + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    /// Number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Whether no callback is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl Callback for CallbackList {
    fn before_iteration(&mut self, snapshot: &IterationSnapshot<'_>) {
        for callback in &mut self.callbacks {
            callback.before_iteration(snapshot);
        }
    }

    fn after_iteration(&mut self, snapshot: &IterationSnapshot<'_>) {
        for callback in &mut self.callbacks {
            callback.after_iteration(snapshot);
        }
    }
}
