//! Bat algorithm.

use crate::algorithm::{
    ensure_non_negative, ensure_probability, Algorithm, AlgorithmResult, ConfigError, Generation,
    Parameters, Setup,
};
use crate::core::Population;
use crate::task::Task;
use crate::util::{normal_sample, random_unit};
use rand::rngs::StdRng;

const LOCAL_SEARCH_SCALE: f64 = 0.001;

/// Echolocation-inspired search with frequency-tuned velocities.
///
/// Each bat draws a frequency in `[min_frequency, max_frequency]`, pulls its
/// velocity by `(x - best) * frequency` and either moves along it or, with
/// probability `1 - pulse_rate`, samples a point just around the best. A
/// move that is no worse than the bat's current fitness is kept with
/// probability `loudness`.
#[derive(Debug, Clone, PartialEq)]
pub struct BatAlgorithm {
    loudness: f64,
    pulse_rate: f64,
    min_frequency: f64,
    max_frequency: f64,
}

impl Default for BatAlgorithm {
    fn default() -> Self {
        Self {
            loudness: 0.5,
            pulse_rate: 0.5,
            min_frequency: 0.0,
            max_frequency: 2.0,
        }
    }
}

impl BatAlgorithm {
    /// Loudness and pulse rate 0.5, frequencies in `[0, 2]`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acceptance probability `A`.
    #[must_use]
    pub fn loudness(mut self, value: f64) -> Self {
        self.loudness = value;
        self
    }

    /// Probability `r` of moving along the velocity instead of searching
    /// around the best.
    #[must_use]
    pub fn pulse_rate(mut self, value: f64) -> Self {
        self.pulse_rate = value;
        self
    }

    /// Frequency range.
    #[must_use]
    pub fn frequency(mut self, min: f64, max: f64) -> Self {
        self.min_frequency = min;
        self.max_frequency = max;
        self
    }
}

impl Algorithm for BatAlgorithm {
    type Member = Vec<f64>;
    /// Velocity of each bat.
    type State = Vec<Vec<f64>>;

    const NAMES: &'static [&'static str] = &["BatAlgorithm", "BA"];

    fn default_population_size(&self) -> usize {
        40
    }

    fn parameters(&self) -> Parameters {
        Parameters::from([
            ("loudness", self.loudness),
            ("pulse_rate", self.pulse_rate),
            ("min_frequency", self.min_frequency),
            ("max_frequency", self.max_frequency),
        ])
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ensure_probability(self.name(), "loudness", self.loudness)?;
        ensure_probability(self.name(), "pulse_rate", self.pulse_rate)?;
        ensure_non_negative(self.name(), "min_frequency", self.min_frequency)?;
        ensure_non_negative(self.name(), "max_frequency", self.max_frequency)?;
        if self.min_frequency > self.max_frequency {
            return Err(ConfigError::InvalidParameter {
                algorithm: self.name(),
                parameter: "max_frequency",
                value: self.max_frequency,
            });
        }
        Ok(())
    }

    fn init_population(
        &mut self,
        task: &mut Task,
        setup: &mut Setup<'_, Vec<f64>>,
    ) -> AlgorithmResult<(Population<Vec<f64>>, Vec<Vec<f64>>)> {
        let population = setup.initialize(task)?;
        let velocities = vec![vec![0.0; task.dimension()]; population.len()];
        Ok((population, velocities))
    }

    fn run_iteration(
        &mut self,
        task: &mut Task,
        generation: Generation<Vec<f64>, Vec<Vec<f64>>>,
        rng: &mut StdRng,
    ) -> AlgorithmResult<Generation<Vec<f64>, Vec<Vec<f64>>>> {
        let Generation {
            mut population,
            mut best,
            state: mut velocities,
        } = generation;
        for idx in 0..population.len() {
            let leader = best
                .x()
                .map_or_else(|| population.member(idx).clone(), <[f64]>::to_vec);
            let frequency =
                self.min_frequency + (self.max_frequency - self.min_frequency) * random_unit(rng);
            let current = population.member(idx);
            for ((v, x), b) in velocities[idx].iter_mut().zip(current).zip(&leader) {
                *v += (x - b) * frequency;
            }
            let candidate: Vec<f64> = if random_unit(rng) > self.pulse_rate {
                leader
                    .iter()
                    .map(|b| b + LOCAL_SEARCH_SCALE * normal_sample(rng))
                    .collect()
            } else {
                current
                    .iter()
                    .zip(&velocities[idx])
                    .map(|(x, v)| x + v)
                    .collect()
            };
            let candidate = task.repair(candidate, rng)?;
            let fitness = task.eval(&candidate)?;
            best = best.challenge(&candidate, fitness);
            if fitness <= population.fitness()[idx] && random_unit(rng) < self.loudness {
                population.replace(idx, candidate, fitness);
            }
        }
        Ok(Generation {
            population,
            best,
            state: velocities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{Benchmark, BenchmarkKind};
    use crate::Optimizer;

    #[test]
    fn each_bat_costs_one_evaluation_per_iteration() {
        let problem = Benchmark::new(BenchmarkKind::Griewank, 5).unwrap();
        let mut task = Task::builder(problem).max_iters(4).build().unwrap();
        let mut optimizer = Optimizer::builder(BatAlgorithm::new())
            .population_size(15)
            .seed(6)
            .build()
            .unwrap();
        let outcome = optimizer.run(&mut task).unwrap();
        assert_eq!(outcome.evaluations, 15 * 5);
        for pair in outcome.stats.best_fitness.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn silent_bats_never_replace_members() {
        let problem = Benchmark::new(BenchmarkKind::Sphere, 2).unwrap();
        let mut task = Task::builder(problem).max_iters(3).build().unwrap();
        let mut optimizer = Optimizer::builder(BatAlgorithm::new().loudness(0.0))
            .population_size(5)
            .seed(1)
            .build()
            .unwrap();
        let mut iterations = optimizer.iterations(&mut task);
        let initial = iterations.next().unwrap().unwrap();
        let start = iterations.generation().unwrap().population.clone();
        for report in iterations.by_ref() {
            report.unwrap();
        }
        let end = iterations.into_generation().unwrap().population;
        assert_eq!(start, end);
        assert_eq!(initial.iteration, 0);
    }

    #[test]
    fn validates_frequency_range() {
        assert!(BatAlgorithm::new().frequency(2.0, 1.0).validate().is_err());
        assert!(BatAlgorithm::new().pulse_rate(1.1).validate().is_err());
        assert!(BatAlgorithm::new().validate().is_ok());
    }
}
