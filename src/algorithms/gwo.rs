//! Grey wolf optimizer.

use crate::algorithm::{Algorithm, AlgorithmResult, Generation, Setup};
use crate::core::Population;
use crate::task::Task;
use crate::util::random_unit;
use rand::rngs::StdRng;

/// Pack hunting led by the three best wolves found so far.
///
/// Every wolf moves to the mean of three points, each pulled toward one
/// leader with an exploration coefficient `a` that falls linearly from 2 to
/// 0 as the task budget is used up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GreyWolfOptimizer;

impl GreyWolfOptimizer {
    /// Creates the optimizer; it has no tunable parameters.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// A leader position and its fitness.
#[derive(Debug, Clone, PartialEq)]
pub struct Wolf {
    /// Position.
    pub x: Vec<f64>,
    /// Direction-adjusted fitness.
    pub fitness: f64,
}

/// The alpha, beta and delta wolves.
#[derive(Debug, Clone, PartialEq)]
pub struct Pack {
    /// Best wolf.
    pub alpha: Wolf,
    /// Second best.
    pub beta: Wolf,
    /// Third best.
    pub delta: Wolf,
}

impl Pack {
    fn from_population(population: &Population<Vec<f64>>) -> Self {
        let order = population.sorted_indices();
        let wolf = |rank: usize| {
            let idx = order[rank.min(order.len() - 1)];
            Wolf {
                x: population.member(idx).clone(),
                fitness: population.fitness()[idx],
            }
        };
        Self {
            alpha: wolf(0),
            beta: wolf(1),
            delta: wolf(2),
        }
    }

    fn offer(&mut self, x: &[f64], fitness: f64) {
        if fitness < self.alpha.fitness {
            self.alpha = Wolf {
                x: x.to_vec(),
                fitness,
            };
        } else if self.alpha.fitness < fitness && fitness < self.beta.fitness {
            self.beta = Wolf {
                x: x.to_vec(),
                fitness,
            };
        } else if self.beta.fitness < fitness && fitness < self.delta.fitness {
            self.delta = Wolf {
                x: x.to_vec(),
                fitness,
            };
        }
    }
}

fn pursue(leader: &[f64], wolf: &[f64], a: f64, j: usize, rng: &mut StdRng) -> f64 {
    let big_a = 2.0 * a * random_unit(rng) - a;
    let c = 2.0 * random_unit(rng);
    leader[j] - big_a * (c * leader[j] - wolf[j]).abs()
}

impl Algorithm for GreyWolfOptimizer {
    type Member = Vec<f64>;
    type State = Pack;

    const NAMES: &'static [&'static str] = &["GreyWolfOptimizer", "GWO"];

    fn min_population_size(&self) -> usize {
        3
    }

    fn init_population(
        &mut self,
        task: &mut Task,
        setup: &mut Setup<'_, Vec<f64>>,
    ) -> AlgorithmResult<(Population<Vec<f64>>, Pack)> {
        let population = setup.initialize(task)?;
        let pack = Pack::from_population(&population);
        Ok((population, pack))
    }

    fn run_iteration(
        &mut self,
        task: &mut Task,
        generation: Generation<Vec<f64>, Pack>,
        rng: &mut StdRng,
    ) -> AlgorithmResult<Generation<Vec<f64>, Pack>> {
        let Generation {
            population,
            mut best,
            state: mut pack,
        } = generation;
        let a = 2.0 - 2.0 * task.progress();
        let (members, _) = population.into_parts();
        let mut moved = Population::with_capacity(members.len());
        for wolf in members {
            let next: Vec<f64> = (0..wolf.len())
                .map(|j| {
                    let x1 = pursue(&pack.alpha.x, &wolf, a, j, rng);
                    let x2 = pursue(&pack.beta.x, &wolf, a, j, rng);
                    let x3 = pursue(&pack.delta.x, &wolf, a, j, rng);
                    (x1 + x2 + x3) / 3.0
                })
                .collect();
            let next = task.repair(next, rng)?;
            let fitness = task.eval(&next)?;
            moved.push(next, fitness);
        }
        for (x, fitness) in moved.iter() {
            pack.offer(x, fitness);
        }
        best = best.challenge(&pack.alpha.x, pack.alpha.fitness);
        Ok(Generation {
            population: moved,
            best,
            state: pack,
        })
    }
}
