//! Hill climbing with random restarts.

use crate::algorithm::{
    ensure_positive, Algorithm, AlgorithmResult, ConfigError, Generation, Parameters, Setup,
};
use crate::core::{Member, Population};
use crate::task::Task;
use crate::util::normal_sample;
use rand::rngs::StdRng;

/// Restarts from a uniform point every iteration and climbs through
/// Gaussian neighbours (standard deviation `delta`) until a neighbour fails
/// to improve or the task stops.
#[derive(Debug, Clone, PartialEq)]
pub struct HillClimbing {
    delta: f64,
}

impl Default for HillClimbing {
    fn default() -> Self {
        Self { delta: 0.5 }
    }
}

impl HillClimbing {
    /// `delta = 0.5`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Neighbourhood standard deviation.
    #[must_use]
    pub fn delta(mut self, value: f64) -> Self {
        self.delta = value;
        self
    }

    fn neighbour(
        &self,
        x: &[f64],
        task: &mut Task,
        rng: &mut StdRng,
    ) -> AlgorithmResult<(Vec<f64>, f64)> {
        let moved: Vec<f64> = x
            .iter()
            .map(|v| v + self.delta * normal_sample(rng))
            .collect();
        let moved = task.repair(moved, rng)?;
        let fitness = task.eval(&moved)?;
        Ok((moved, fitness))
    }
}

impl Algorithm for HillClimbing {
    type Member = Vec<f64>;
    type State = ();

    const NAMES: &'static [&'static str] = &["HillClimbAlgorithm", "HC", "HillClimbing"];

    fn fixed_population_size(&self) -> Option<usize> {
        Some(1)
    }

    fn parameters(&self) -> Parameters {
        Parameters::from([("delta", self.delta)])
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive(self.name(), "delta", self.delta)
    }

    fn init_population(
        &mut self,
        task: &mut Task,
        setup: &mut Setup<'_, Vec<f64>>,
    ) -> AlgorithmResult<(Population<Vec<f64>>, ())> {
        Ok((setup.initialize(task)?, ()))
    }

    fn run_iteration(
        &mut self,
        task: &mut Task,
        generation: Generation<Vec<f64>, ()>,
        rng: &mut StdRng,
    ) -> AlgorithmResult<Generation<Vec<f64>, ()>> {
        let mut best = generation.best;
        let mut climbers = Population::with_capacity(generation.population.len());
        for _ in 0..generation.population.len() {
            let (mut x, mut fitness) = Vec::<f64>::random(task, rng)?;
            while !task.stopping_condition() {
                let (next, next_fitness) = self.neighbour(&x, task, rng)?;
                if next_fitness < fitness {
                    x = next;
                    fitness = next_fitness;
                } else {
                    break;
                }
            }
            best = best.challenge(&x, fitness);
            climbers.push(x, fitness);
        }
        Ok(Generation {
            population: climbers,
            best,
            state: generation.state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{Benchmark, BenchmarkKind};
    use crate::Optimizer;

    #[test]
    fn population_is_always_one() {
        let optimizer = Optimizer::builder(HillClimbing::new())
            .population_size(40)
            .build()
            .unwrap();
        assert_eq!(optimizer.population_size(), 1);
    }

    #[test]
    fn climbing_respects_the_evaluation_budget() {
        let problem = Benchmark::new(BenchmarkKind::Sphere, 3).unwrap();
        let mut task = Task::builder(problem).max_evals(250).build().unwrap();
        let mut optimizer = Optimizer::builder(HillClimbing::new().delta(0.1))
            .seed(14)
            .build()
            .unwrap();
        let outcome = optimizer.run(&mut task).unwrap();
        assert_eq!(outcome.evaluations, 250);
        assert!(outcome.iterations >= 1);
        assert!(HillClimbing::new().delta(0.0).validate().is_err());
    }
}
