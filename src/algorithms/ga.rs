//! Generational real-coded genetic algorithm.
//!
//! Each iteration replaces the whole population with offspring: parents come
//! from the selection operator, pairs are recombined by the crossover
//! operator, and every child is mutated, repaired against the task bounds
//! and evaluated. Any of the three operators can be swapped out; the
//! defaults are a size-three tournament, simulated binary crossover and
//! polynomial mutation.

use crate::algorithm::{Algorithm, AlgorithmResult, Generation, Parameters, Setup};
use crate::core::{get_best, Population};
use crate::ops::{
    CrossoverOperator, MutationOperator, PolynomialMutation, SelectionOperator,
    SimulatedBinaryCrossover, TournamentSelection,
};
use crate::task::Task;
use crate::OptimizeError;
use rand::rngs::StdRng;
use std::fmt;
use std::sync::Arc;

const DEFAULT_SBX_ETA: f64 = 15.0;
const DEFAULT_POLY_ETA: f64 = 20.0;
const DEFAULT_TOURNAMENT_SIZE: usize = 3;

/// Genetic algorithm over plain position vectors.
///
/// # Examples
/// ```
/// use swarmlab::algorithms::GeneticAlgorithm;
/// use swarmlab::ops::{BlendAlphaCrossover, TournamentSelection};
/// use swarmlab::{Benchmark, BenchmarkKind, Optimizer, Task};
///
/// let algorithm = GeneticAlgorithm::new()
///     .crossover(BlendAlphaCrossover::new(0.5).unwrap())
///     .selection(TournamentSelection::new(2).unwrap());
/// let problem = Benchmark::new(BenchmarkKind::Sphere, 3).unwrap();
/// let mut task = Task::builder(problem).max_iters(10).build().unwrap();
/// let mut optimizer = Optimizer::builder(algorithm).population_size(16).seed(5).build().unwrap();
/// let outcome = optimizer.run(&mut task).unwrap();
/// assert_eq!(outcome.evaluations, 16 * 11);
/// ```
#[derive(Clone)]
pub struct GeneticAlgorithm {
    crossover: Option<Arc<dyn CrossoverOperator>>,
    mutation: Option<Arc<dyn MutationOperator>>,
    selection: Option<Arc<dyn SelectionOperator>>,
}

impl Default for GeneticAlgorithm {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GeneticAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneticAlgorithm")
            .field("custom_crossover", &self.crossover.is_some())
            .field("custom_mutation", &self.mutation.is_some())
            .field("custom_selection", &self.selection.is_some())
            .finish()
    }
}

impl GeneticAlgorithm {
    /// Uses the default operators.
    #[must_use]
    pub fn new() -> Self {
        Self {
            crossover: None,
            mutation: None,
            selection: None,
        }
    }

    /// Replaces the crossover operator.
    #[must_use]
    pub fn crossover(mut self, operator: impl CrossoverOperator + 'static) -> Self {
        self.crossover = Some(Arc::new(operator));
        self
    }

    /// Replaces the mutation operator. The default polynomial mutation is
    /// built from the task bounds when the run starts.
    #[must_use]
    pub fn mutation(mut self, operator: impl MutationOperator + 'static) -> Self {
        self.mutation = Some(Arc::new(operator));
        self
    }

    /// Replaces the selection operator.
    #[must_use]
    pub fn selection(mut self, operator: impl SelectionOperator + 'static) -> Self {
        self.selection = Some(Arc::new(operator));
        self
    }
}

/// Operators resolved for one run.
#[derive(Clone)]
pub struct Operators {
    crossover: Arc<dyn CrossoverOperator>,
    mutation: Arc<dyn MutationOperator>,
    selection: Arc<dyn SelectionOperator>,
}

impl fmt::Debug for Operators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Operators")
    }
}

impl Algorithm for GeneticAlgorithm {
    type Member = Vec<f64>;
    type State = Operators;

    const NAMES: &'static [&'static str] = &["GeneticAlgorithm", "GA"];

    fn min_population_size(&self) -> usize {
        2
    }

    fn parameters(&self) -> Parameters {
        let mut parameters = Parameters::new();
        if self.crossover.is_none() {
            parameters.insert("sbx_distribution_index", DEFAULT_SBX_ETA);
        }
        if self.mutation.is_none() {
            parameters.insert("mutation_distribution_index", DEFAULT_POLY_ETA);
        }
        if self.selection.is_none() {
            #[allow(clippy::cast_precision_loss)]
            parameters.insert("tournament_size", DEFAULT_TOURNAMENT_SIZE as f64);
        }
        parameters
    }

    fn init_population(
        &mut self,
        task: &mut Task,
        setup: &mut Setup<'_, Vec<f64>>,
    ) -> AlgorithmResult<(Population<Vec<f64>>, Operators)> {
        let crossover: Arc<dyn CrossoverOperator> = match &self.crossover {
            Some(operator) => Arc::clone(operator),
            None => Arc::new(SimulatedBinaryCrossover::new(DEFAULT_SBX_ETA)?),
        };
        let mutation: Arc<dyn MutationOperator> = match &self.mutation {
            Some(operator) => Arc::clone(operator),
            None => {
                #[allow(clippy::cast_precision_loss)]
                let probability = 1.0 / task.dimension() as f64;
                Arc::new(PolynomialMutation::new(
                    task.lower().to_vec(),
                    task.upper().to_vec(),
                    DEFAULT_POLY_ETA,
                    probability,
                )?)
            }
        };
        let selection: Arc<dyn SelectionOperator> = match &self.selection {
            Some(operator) => Arc::clone(operator),
            None => Arc::new(TournamentSelection::new(DEFAULT_TOURNAMENT_SIZE)?),
        };
        let population = setup.initialize(task)?;
        Ok((
            population,
            Operators {
                crossover,
                mutation,
                selection,
            },
        ))
    }

    fn run_iteration(
        &mut self,
        task: &mut Task,
        generation: Generation<Vec<f64>, Operators>,
        rng: &mut StdRng,
    ) -> AlgorithmResult<Generation<Vec<f64>, Operators>> {
        let Generation {
            population,
            best,
            state,
        } = generation;
        let size = population.len();
        let mut offspring = Population::with_capacity(size);
        while offspring.len() < size {
            let (a, b) = state
                .selection
                .select_pair(population.fitness(), rng)
                .ok_or_else(|| OptimizeError::Algorithm {
                    algorithm: "GeneticAlgorithm",
                    message: String::from("selection returned no parents"),
                })?;
            let (child_a, child_b) =
                state
                    .crossover
                    .crossover(population.member(a), population.member(b), rng);
            for child in [child_a, child_b] {
                if offspring.len() == size {
                    break;
                }
                let child = task.repair(state.mutation.mutate(&child, rng), rng)?;
                let fitness = task.eval(&child)?;
                offspring.push(child, fitness);
            }
        }
        let best = get_best(&offspring, best);
        Ok(Generation {
            population: offspring,
            best,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::ConfigError;
    use crate::functions::{Benchmark, BenchmarkKind};
    use crate::ops::GaussianMutation;
    use crate::Optimizer;

    fn task(max_iters: usize) -> Task {
        let problem = Benchmark::new(BenchmarkKind::Rastrigin, 4).unwrap();
        Task::builder(problem).max_iters(max_iters).build().unwrap()
    }

    #[test]
    fn odd_population_is_filled_exactly() {
        let mut task = task(3);
        let mut optimizer = Optimizer::builder(GeneticAlgorithm::new())
            .population_size(7)
            .seed(12)
            .build()
            .unwrap();
        let outcome = optimizer.run(&mut task).unwrap();
        assert_eq!(outcome.evaluations, 7 * 4);
        assert_eq!(outcome.iterations, 3);
    }

    #[test]
    fn custom_mutation_output_is_repaired() {
        let wild = GaussianMutation::new(vec![-100.0; 4], vec![100.0; 4], 50.0, 1.0).unwrap();
        let mut task = task(4);
        let mut optimizer = Optimizer::builder(GeneticAlgorithm::new().mutation(wild))
            .population_size(10)
            .seed(2)
            .build()
            .unwrap();
        let mut iterations = optimizer.iterations(&mut task);
        for report in iterations.by_ref() {
            report.unwrap();
        }
        let generation = iterations.into_generation().unwrap();
        for (member, _) in generation.population.iter() {
            assert!(member.iter().all(|v| (-5.12..=5.12).contains(v)));
        }
    }

    #[test]
    fn reports_default_operator_parameters() {
        let parameters = GeneticAlgorithm::new().parameters();
        assert_eq!(parameters.get("tournament_size"), Some(&3.0));
        assert_eq!(parameters.get("sbx_distribution_index"), Some(&15.0));
        assert!(GeneticAlgorithm::new()
            .selection(TournamentSelection::new(2).unwrap())
            .parameters()
            .get("tournament_size")
            .is_none());
    }

    #[test]
    fn rejects_single_member_population() {
        assert!(matches!(
            Optimizer::builder(GeneticAlgorithm::new())
                .population_size(1)
                .build(),
            Err(ConfigError::PopulationTooSmall { required: 2, .. })
        ));
    }
}
