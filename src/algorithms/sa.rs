//! Simulated annealing.

use crate::algorithm::{
    ensure_non_negative, ensure_positive, Algorithm, AlgorithmResult, ConfigError, Generation,
    Parameters, Setup,
};
use crate::core::Population;
use crate::task::Task;
use crate::util::random_unit;
use rand::rngs::StdRng;

/// How the temperature falls after each iteration.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Cooling {
    /// Subtract `delta_temperature`.
    #[default]
    Delta,
    /// Subtract `starting_temperature / budget`, where the budget is the
    /// evaluation limit or, failing that, the iteration limit. Falls back to
    /// [`Cooling::Delta`] on an unbudgeted task.
    Linear,
}

/// Single-point annealing with a uniform box neighbourhood.
///
/// A candidate is drawn uniformly from `x ± delta / 2`. It replaces the
/// current point when it is better, or otherwise with the Metropolis
/// probability `exp(-(f_new - f) / T)`.
///
/// # Examples
/// ```
/// use swarmlab::algorithms::{Cooling, SimulatedAnnealing};
/// use swarmlab::{Benchmark, BenchmarkKind, Optimizer, Task};
///
/// let problem = Benchmark::new(BenchmarkKind::Sphere, 2).unwrap();
/// let mut task = Task::builder(problem).max_evals(300).build().unwrap();
/// let algorithm = SimulatedAnnealing::new().cooling(Cooling::Linear).delta(0.2);
/// let mut optimizer = Optimizer::builder(algorithm)
///     .population_size(30) // ignored: annealing keeps one point
///     .seed(9)
///     .build()
///     .unwrap();
/// assert_eq!(optimizer.population_size(), 1);
/// let outcome = optimizer.run(&mut task).unwrap();
/// assert_eq!(outcome.iterations, 299);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedAnnealing {
    delta: f64,
    starting_temperature: f64,
    delta_temperature: f64,
    epsilon: f64,
    cooling: Cooling,
}

impl Default for SimulatedAnnealing {
    fn default() -> Self {
        Self {
            delta: 0.5,
            starting_temperature: 2000.0,
            delta_temperature: 0.8,
            epsilon: 1e-23,
            cooling: Cooling::Delta,
        }
    }
}

impl SimulatedAnnealing {
    /// `delta = 0.5`, `T0 = 2000`, `dT = 0.8`, delta cooling.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Width of the neighbourhood box.
    #[must_use]
    pub fn delta(mut self, value: f64) -> Self {
        self.delta = value;
        self
    }

    /// Initial temperature.
    #[must_use]
    pub fn starting_temperature(mut self, value: f64) -> Self {
        self.starting_temperature = value;
        self
    }

    /// Step used by [`Cooling::Delta`].
    #[must_use]
    pub fn delta_temperature(mut self, value: f64) -> Self {
        self.delta_temperature = value;
        self
    }

    /// Lowest temperature the schedule can reach.
    #[must_use]
    pub fn epsilon(mut self, value: f64) -> Self {
        self.epsilon = value;
        self
    }

    /// Cooling schedule.
    #[must_use]
    pub fn cooling(mut self, cooling: Cooling) -> Self {
        self.cooling = cooling;
        self
    }

    fn cool(&self, temperature: f64, task: &Task) -> f64 {
        let budget = task.max_evals().or_else(|| task.max_iters());
        let step = match (self.cooling, budget) {
            #[allow(clippy::cast_precision_loss)]
            (Cooling::Linear, Some(budget)) if budget > 0 => {
                self.starting_temperature / budget as f64
            }
            _ => self.delta_temperature,
        };
        (temperature - step).max(self.epsilon)
    }
}

/// Metropolis rule for a minimisation step from `current` to `candidate`.
fn accept(current: f64, candidate: f64, temperature: f64, draw: f64) -> bool {
    let delta = candidate - current;
    delta < 0.0 || draw < (-delta / temperature).exp()
}

impl Algorithm for SimulatedAnnealing {
    type Member = Vec<f64>;
    /// Current temperature.
    type State = f64;

    const NAMES: &'static [&'static str] = &["SimulatedAnnealing", "SA"];

    fn fixed_population_size(&self) -> Option<usize> {
        Some(1)
    }

    fn parameters(&self) -> Parameters {
        Parameters::from([
            ("delta", self.delta),
            ("starting_temperature", self.starting_temperature),
            ("delta_temperature", self.delta_temperature),
            ("epsilon", self.epsilon),
        ])
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive(self.name(), "delta", self.delta)?;
        ensure_positive(self.name(), "starting_temperature", self.starting_temperature)?;
        ensure_non_negative(self.name(), "delta_temperature", self.delta_temperature)?;
        ensure_positive(self.name(), "epsilon", self.epsilon)
    }

    fn init_population(
        &mut self,
        task: &mut Task,
        setup: &mut Setup<'_, Vec<f64>>,
    ) -> AlgorithmResult<(Population<Vec<f64>>, f64)> {
        Ok((setup.initialize(task)?, self.starting_temperature))
    }

    fn run_iteration(
        &mut self,
        task: &mut Task,
        generation: Generation<Vec<f64>, f64>,
        rng: &mut StdRng,
    ) -> AlgorithmResult<Generation<Vec<f64>, f64>> {
        let Generation {
            mut population,
            mut best,
            state: temperature,
        } = generation;
        for idx in 0..population.len() {
            let candidate: Vec<f64> = population
                .member(idx)
                .iter()
                .map(|x| x - self.delta / 2.0 + random_unit(rng) * self.delta)
                .collect();
            let candidate = task.repair(candidate, rng)?;
            let fitness = task.eval(&candidate)?;
            best = best.challenge(&candidate, fitness);
            if accept(population.fitness()[idx], fitness, temperature, random_unit(rng)) {
                population.replace(idx, candidate, fitness);
            }
        }
        Ok(Generation {
            population,
            best,
            state: self.cool(temperature, task),
        })
    }
}
