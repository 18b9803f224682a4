//! Differential evolution.

use crate::algorithm::{
    ensure_positive, ensure_probability, Algorithm, AlgorithmResult, ConfigError, Generation,
    Parameters, Setup,
};
use crate::core::{Individual, Population};
use crate::task::Task;
use crate::util::{distinct_indices, random_index, random_unit};
use rand::rngs::StdRng;

/// Mutation scheme used to build donor vectors.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    /// `r1 + F (r2 - r3)`
    #[default]
    Rand1,
    /// `best + F (r1 - r2)`
    Best1,
    /// `r1 + F (r2 - r3) + F (r4 - r5)`
    Rand2,
    /// `best + F (r1 - r2) + F (r3 - r4)`
    Best2,
    /// `x + F (r1 - r2) + F (r3 - r4)`
    CurrentToRand1,
    /// `x + F (best - x) + F (r1 - r2)`
    CurrentToBest1,
}

impl Strategy {
    /// Number of distinct random members the scheme draws, besides the target.
    #[must_use]
    pub fn donors(self) -> usize {
        match self {
            Self::Best1 | Self::CurrentToBest1 => 2,
            Self::Rand1 => 3,
            Self::Best2 | Self::CurrentToRand1 => 4,
            Self::Rand2 => 5,
        }
    }

    fn mutant(self, target: &[f64], best: &[f64], r: &[&[f64]], f: f64, j: usize) -> f64 {
        match self {
            Self::Rand1 => r[0][j] + f * (r[1][j] - r[2][j]),
            Self::Best1 => best[j] + f * (r[0][j] - r[1][j]),
            Self::Rand2 => r[0][j] + f * (r[1][j] - r[2][j]) + f * (r[3][j] - r[4][j]),
            Self::Best2 => best[j] + f * (r[0][j] - r[1][j]) + f * (r[2][j] - r[3][j]),
            Self::CurrentToRand1 => {
                target[j] + f * (r[0][j] - r[1][j]) + f * (r[2][j] - r[3][j])
            }
            Self::CurrentToBest1 => {
                target[j] + f * (best[j] - target[j]) + f * (r[0][j] - r[1][j])
            }
        }
    }
}

/// Classic DE with binomial crossover and greedy one-to-one replacement.
///
/// # Examples
/// ```
/// use swarmlab::algorithms::{DifferentialEvolution, Strategy};
/// use swarmlab::{Benchmark, BenchmarkKind, Optimizer, Task};
///
/// let problem = Benchmark::new(BenchmarkKind::Sphere, 4).unwrap();
/// let mut task = Task::builder(problem).max_evals(1_000).build().unwrap();
/// let algorithm = DifferentialEvolution::new()
///     .differential_weight(0.5)
///     .crossover_probability(0.9)
///     .strategy(Strategy::Best1);
/// let mut optimizer = Optimizer::builder(algorithm).population_size(20).seed(3).build().unwrap();
/// let outcome = optimizer.run(&mut task).unwrap();
/// assert!(outcome.best_fitness < 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DifferentialEvolution {
    differential_weight: f64,
    crossover_probability: f64,
    strategy: Strategy,
}

impl Default for DifferentialEvolution {
    fn default() -> Self {
        Self {
            differential_weight: 1.0,
            crossover_probability: 0.8,
            strategy: Strategy::Rand1,
        }
    }
}

impl DifferentialEvolution {
    /// Default settings: `F = 1.0`, `CR = 0.8`, rand/1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scale factor `F` applied to difference vectors.
    #[must_use]
    pub fn differential_weight(mut self, value: f64) -> Self {
        self.differential_weight = value;
        self
    }

    /// Per-coordinate crossover probability `CR`.
    #[must_use]
    pub fn crossover_probability(mut self, value: f64) -> Self {
        self.crossover_probability = value;
        self
    }

    /// Donor construction scheme.
    #[must_use]
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    fn trial(
        &self,
        population: &Population<Individual>,
        idx: usize,
        best: &[f64],
        rng: &mut StdRng,
    ) -> Vec<f64> {
        let picks = distinct_indices(population.len(), self.strategy.donors(), Some(idx), rng);
        let donors: Vec<&[f64]> = picks
            .iter()
            .map(|&pick| population.member(pick).x())
            .collect();
        let target = population.member(idx).x();
        let forced = random_index(target.len(), rng);
        target
            .iter()
            .enumerate()
            .map(|(j, &value)| {
                if j == forced || random_unit(rng) < self.crossover_probability {
                    self.strategy
                        .mutant(target, best, &donors, self.differential_weight, j)
                } else {
                    value
                }
            })
            .collect()
    }
}

impl Algorithm for DifferentialEvolution {
    type Member = Individual;
    type State = ();

    const NAMES: &'static [&'static str] = &["DifferentialEvolution", "DE"];

    fn min_population_size(&self) -> usize {
        self.strategy.donors() + 1
    }

    fn parameters(&self) -> Parameters {
        Parameters::from([
            ("differential_weight", self.differential_weight),
            ("crossover_probability", self.crossover_probability),
        ])
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive(self.name(), "differential_weight", self.differential_weight)?;
        ensure_probability(self.name(), "crossover_probability", self.crossover_probability)
    }

    fn init_population(
        &mut self,
        task: &mut Task,
        setup: &mut Setup<'_, Individual>,
    ) -> AlgorithmResult<(Population<Individual>, ())> {
        Ok((setup.initialize(task)?, ()))
    }

    fn run_iteration(
        &mut self,
        task: &mut Task,
        generation: Generation<Individual, ()>,
        rng: &mut StdRng,
    ) -> AlgorithmResult<Generation<Individual, ()>> {
        let Generation {
            mut population,
            mut best,
            state,
        } = generation;
        let anchor = match best.x() {
            Some(x) => x.to_vec(),
            None => population
                .best_index()
                .map(|idx| population.member(idx).x().to_vec())
                .unwrap_or_else(|| task.lower().to_vec()),
        };
        for idx in 0..population.len() {
            let mut trial = Individual::new(self.trial(&population, idx, &anchor, rng));
            trial.evaluate(task, rng)?;
            let fitness = trial.fitness();
            if fitness < population.fitness()[idx] {
                best = best.challenge(trial.x(), fitness);
                population.replace(idx, trial, fitness);
            }
        }
        Ok(Generation {
            population,
            best,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{Benchmark, BenchmarkKind};
    use crate::Optimizer;

    #[test]
    fn minimum_population_follows_strategy() {
        let de = DifferentialEvolution::new().strategy(Strategy::Rand2);
        assert_eq!(de.min_population_size(), 6);
        assert!(matches!(
            Optimizer::builder(de).population_size(5).build(),
            Err(ConfigError::PopulationTooSmall {
                required: 6,
                found: 5,
                ..
            })
        ));
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        assert!(DifferentialEvolution::new()
            .crossover_probability(1.5)
            .validate()
            .is_err());
        assert!(DifferentialEvolution::new()
            .differential_weight(0.0)
            .validate()
            .is_err());
    }

    #[test]
    fn every_strategy_keeps_members_inside_bounds() {
        let strategies = [
            Strategy::Rand1,
            Strategy::Best1,
            Strategy::Rand2,
            Strategy::Best2,
            Strategy::CurrentToRand1,
            Strategy::CurrentToBest1,
        ];
        for strategy in strategies {
            let problem = Benchmark::new(BenchmarkKind::Rastrigin, 3).unwrap();
            let mut task = Task::builder(problem).max_iters(5).build().unwrap();
            let mut optimizer = Optimizer::builder(DifferentialEvolution::new().strategy(strategy))
                .population_size(10)
                .seed(4)
                .build()
                .unwrap();
            let mut iterations = optimizer.iterations(&mut task);
            for report in iterations.by_ref() {
                report.unwrap();
            }
            let generation = iterations.into_generation().unwrap();
            for (member, fitness) in generation.population.iter() {
                assert!(member.x().iter().all(|v| (-5.12..=5.12).contains(v)));
                assert_eq!(member.fitness(), fitness);
            }
        }
    }

    #[test]
    fn greedy_selection_never_worsens_a_slot() {
        let problem = Benchmark::new(BenchmarkKind::Sphere, 2).unwrap();
        let mut task = Task::builder(problem).max_evals(500).build().unwrap();
        let mut optimizer = Optimizer::builder(DifferentialEvolution::new())
            .population_size(8)
            .seed(10)
            .build()
            .unwrap();
        let mut previous: Option<Vec<f64>> = None;
        let mut iterations = optimizer.iterations(&mut task);
        while let Some(report) = iterations.next() {
            report.unwrap();
            let fitness = iterations
                .generation()
                .unwrap()
                .population
                .fitness()
                .to_vec();
            if let Some(previous) = previous {
                for (new, old) in fitness.iter().zip(&previous) {
                    assert!(new <= old);
                }
            }
            previous = Some(fitness);
        }
    }
}
