//! Firefly algorithm.

use crate::algorithm::{
    ensure_non_negative, ensure_positive, Algorithm, AlgorithmResult, ConfigError, Generation,
    Parameters, Setup,
};
use crate::core::Population;
use crate::task::Task;
use crate::util::{euclidean_distance, random_unit};
use rand::rngs::StdRng;

/// Iterations assumed for the alpha schedule when the task has no budget.
const FALLBACK_HORIZON: usize = 1_000;

/// Fireflies move toward every brighter (fitter) neighbour, with an
/// attraction that fades with distance and a random step that shrinks over
/// the run.
///
/// Attraction toward a neighbour at distance `r` is
/// `(1 - beta_min) exp(-gamma r^2) + beta_min`. The random step is scaled by
/// `alpha` and the task range; `alpha` decays geometrically so that it
/// reaches roughly `1e-4` of its start value by the end of the budget.
#[derive(Debug, Clone, PartialEq)]
pub struct FireflyAlgorithm {
    alpha: f64,
    beta_min: f64,
    gamma: f64,
}

impl Default for FireflyAlgorithm {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta_min: 1.0,
            gamma: 2.0,
        }
    }
}

impl FireflyAlgorithm {
    /// `alpha = 1`, `beta_min = 1`, `gamma = 2`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial randomisation step.
    #[must_use]
    pub fn alpha(mut self, value: f64) -> Self {
        self.alpha = value;
        self
    }

    /// Attraction at large distances.
    #[must_use]
    pub fn beta_min(mut self, value: f64) -> Self {
        self.beta_min = value;
        self
    }

    /// Light absorption coefficient.
    #[must_use]
    pub fn gamma(mut self, value: f64) -> Self {
        self.gamma = value;
        self
    }

    fn attraction(&self, distance: f64) -> f64 {
        (1.0 - self.beta_min) * (-self.gamma * distance * distance).exp() + self.beta_min
    }
}

fn decay_horizon(task: &Task, population_size: usize) -> usize {
    match (task.max_evals(), task.max_iters()) {
        (Some(evals), _) => evals / population_size.max(1),
        (None, Some(iters)) => iters,
        (None, None) => FALLBACK_HORIZON,
    }
    .max(1)
}

fn decayed(alpha: f64, horizon: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let delta = 1.0 - (1e-4_f64 / 0.9).powf(1.0 / horizon as f64);
    (1.0 - delta) * alpha
}

impl Algorithm for FireflyAlgorithm {
    type Member = Vec<f64>;
    /// Current randomisation step.
    type State = f64;

    const NAMES: &'static [&'static str] = &["FireflyAlgorithm", "FA"];

    fn default_population_size(&self) -> usize {
        20
    }

    fn parameters(&self) -> Parameters {
        Parameters::from([
            ("alpha", self.alpha),
            ("beta_min", self.beta_min),
            ("gamma", self.gamma),
        ])
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ensure_non_negative(self.name(), "alpha", self.alpha)?;
        ensure_non_negative(self.name(), "beta_min", self.beta_min)?;
        ensure_positive(self.name(), "gamma", self.gamma)
    }

    fn init_population(
        &mut self,
        task: &mut Task,
        setup: &mut Setup<'_, Vec<f64>>,
    ) -> AlgorithmResult<(Population<Vec<f64>>, f64)> {
        Ok((setup.initialize(task)?, self.alpha))
    }

    fn run_iteration(
        &mut self,
        task: &mut Task,
        generation: Generation<Vec<f64>, f64>,
        rng: &mut StdRng,
    ) -> AlgorithmResult<Generation<Vec<f64>, f64>> {
        let Generation {
            population,
            mut best,
            state: alpha,
        } = generation;
        let alpha = decayed(alpha, decay_horizon(task, population.len()));
        let order = population.sorted_indices();
        let (members, fitness) = population.into_parts();
        let mut next = Population::with_capacity(members.len());
        for &i in &order {
            let mut x = members[i].clone();
            let mut moved = false;
            for &j in &order {
                if fitness[j] >= fitness[i] {
                    continue;
                }
                let beta = self.attraction(euclidean_distance(&x, &members[j]));
                let stepped: Vec<f64> = x
                    .iter()
                    .zip(&members[j])
                    .zip(task.range())
                    .map(|((xi, xj), range)| {
                        xi * (1.0 - beta) + xj * beta + alpha * (random_unit(rng) - 0.5) * range
                    })
                    .collect();
                x = task.repair(stepped, rng)?;
                moved = true;
            }
            let f = if moved { task.eval(&x)? } else { fitness[i] };
            best = best.challenge(&x, f);
            next.push(x, f);
        }
        Ok(Generation {
            population: next,
            best,
            state: alpha,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{Benchmark, BenchmarkKind};
    use crate::Optimizer;

    #[test]
    fn alpha_decays_to_about_1e4_over_the_horizon() {
        let mut alpha = 1.0;
        for _ in 0..50 {
            alpha = decayed(alpha, 50);
        }
        assert!((alpha - 1e-4 / 0.9).abs() < 1e-9);
    }

    #[test]
    fn brightest_firefly_is_not_re_evaluated() {
        let problem = Benchmark::new(BenchmarkKind::Sphere, 3).unwrap();
        let mut task = Task::builder(problem).max_iters(1).build().unwrap();
        let mut optimizer = Optimizer::builder(FireflyAlgorithm::new())
            .population_size(6)
            .seed(30)
            .build()
            .unwrap();
        let outcome = optimizer.run(&mut task).unwrap();
        // distinct random draws: everyone but the brightest moves once
        assert_eq!(outcome.evaluations, 6 + 5);
    }

    #[test]
    fn state_carries_the_decayed_alpha() {
        let problem = Benchmark::new(BenchmarkKind::Rastrigin, 2).unwrap();
        let mut task = Task::builder(problem).max_iters(3).build().unwrap();
        let mut optimizer = Optimizer::builder(FireflyAlgorithm::new().alpha(0.5))
            .population_size(5)
            .seed(4)
            .build()
            .unwrap();
        let mut iterations = optimizer.iterations(&mut task);
        for report in iterations.by_ref() {
            report.unwrap();
        }
        let alpha = iterations.into_generation().unwrap().state;
        assert!(alpha < 0.5 && alpha > 0.0);
        assert!(FireflyAlgorithm::new().gamma(0.0).validate().is_err());
    }
}
