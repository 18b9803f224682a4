//! Global-best particle swarm optimisation.

use crate::algorithm::{
    ensure_non_negative, Algorithm, AlgorithmResult, ConfigError, Generation, Parameters, Setup,
};
use crate::core::Population;
use crate::ops::{Reflect, RepairOperator};
use crate::task::Task;
use crate::util::random_unit;
use rand::rngs::StdRng;

/// Particle swarm with inertia weight and bounded velocities.
///
/// Every particle moves by
/// `v = w v + c1 r1 (personal_best - x) + c2 r2 (global_best - x)`,
/// after which the velocity is reflected back into
/// `[min_velocity, max_velocity]` and the position is repaired by the task.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSwarm {
    cognitive: f64,
    social: f64,
    inertia: f64,
    min_velocity: f64,
    max_velocity: f64,
}

impl Default for ParticleSwarm {
    fn default() -> Self {
        Self {
            cognitive: 2.0,
            social: 2.0,
            inertia: 0.7,
            min_velocity: -1.5,
            max_velocity: 1.5,
        }
    }
}

impl ParticleSwarm {
    /// `c1 = c2 = 2`, `w = 0.7`, velocity in `[-1.5, 1.5]`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cognitive weight `c1`.
    #[must_use]
    pub fn cognitive(mut self, value: f64) -> Self {
        self.cognitive = value;
        self
    }

    /// Social weight `c2`.
    #[must_use]
    pub fn social(mut self, value: f64) -> Self {
        self.social = value;
        self
    }

    /// Inertia weight `w`.
    #[must_use]
    pub fn inertia(mut self, value: f64) -> Self {
        self.inertia = value;
        self
    }

    /// Velocity range. Pass infinite values to leave velocities unbounded.
    #[must_use]
    pub fn velocity_bounds(mut self, min: f64, max: f64) -> Self {
        self.min_velocity = min;
        self.max_velocity = max;
        self
    }

    fn bounded_velocity(&self) -> bool {
        self.min_velocity.is_finite() && self.max_velocity.is_finite()
    }
}

/// Per-particle memory carried between iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct SwarmState {
    /// Current velocity of each particle.
    pub velocities: Vec<Vec<f64>>,
    /// Best position each particle has visited.
    pub personal_best: Vec<Vec<f64>>,
    /// Fitness of [`Self::personal_best`].
    pub personal_best_fitness: Vec<f64>,
}

impl Algorithm for ParticleSwarm {
    type Member = Vec<f64>;
    type State = SwarmState;

    const NAMES: &'static [&'static str] = &["ParticleSwarmAlgorithm", "PSO", "ParticleSwarm"];

    fn default_population_size(&self) -> usize {
        25
    }

    fn parameters(&self) -> Parameters {
        Parameters::from([
            ("c1", self.cognitive),
            ("c2", self.social),
            ("w", self.inertia),
            ("min_velocity", self.min_velocity),
            ("max_velocity", self.max_velocity),
        ])
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ensure_non_negative(self.name(), "c1", self.cognitive)?;
        ensure_non_negative(self.name(), "c2", self.social)?;
        ensure_non_negative(self.name(), "w", self.inertia)?;
        if self.min_velocity.is_nan() || self.min_velocity > self.max_velocity {
            return Err(ConfigError::InvalidParameter {
                algorithm: self.name(),
                parameter: "min_velocity",
                value: self.min_velocity,
            });
        }
        Ok(())
    }

    fn init_population(
        &mut self,
        task: &mut Task,
        setup: &mut Setup<'_, Vec<f64>>,
    ) -> AlgorithmResult<(Population<Vec<f64>>, SwarmState)> {
        let population = setup.initialize(task)?;
        let state = SwarmState {
            velocities: vec![vec![0.0; task.dimension()]; population.len()],
            personal_best: population.members().to_vec(),
            personal_best_fitness: population.fitness().to_vec(),
        };
        Ok((population, state))
    }

    fn run_iteration(
        &mut self,
        task: &mut Task,
        generation: Generation<Vec<f64>, SwarmState>,
        rng: &mut StdRng,
    ) -> AlgorithmResult<Generation<Vec<f64>, SwarmState>> {
        let Generation {
            population,
            mut best,
            mut state,
        } = generation;
        let dimension = task.dimension();
        let min_velocity = vec![self.min_velocity; dimension];
        let max_velocity = vec![self.max_velocity; dimension];
        let global = best.x().map(<[f64]>::to_vec);
        let (members, _) = population.into_parts();
        let mut next = Population::with_capacity(members.len());
        for (idx, position) in members.into_iter().enumerate() {
            let guide = global.as_deref().unwrap_or(&state.personal_best[idx]);
            let velocity = &mut state.velocities[idx];
            for j in 0..dimension {
                velocity[j] = self.inertia * velocity[j]
                    + self.cognitive * random_unit(rng) * (state.personal_best[idx][j] - position[j])
                    + self.social * random_unit(rng) * (guide[j] - position[j]);
            }
            if self.bounded_velocity() {
                Reflect.repair(velocity, &min_velocity, &max_velocity, rng);
            }
            let moved: Vec<f64> = position.iter().zip(velocity.iter()).map(|(x, v)| x + v).collect();
            let moved = task.repair(moved, rng)?;
            let fitness = task.eval(&moved)?;
            if fitness < state.personal_best_fitness[idx] {
                state.personal_best[idx].clone_from(&moved);
                state.personal_best_fitness[idx] = fitness;
            }
            best = best.challenge(&moved, fitness);
            next.push(moved, fitness);
        }
        Ok(Generation {
            population: next,
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
    fn velocities_stay_within_bounds() {
        let problem = Benchmark::new(BenchmarkKind::Schwefel, 3).unwrap();
        let mut task = Task::builder(problem).max_iters(6).build().unwrap();
        let mut optimizer = Optimizer::builder(ParticleSwarm::new().velocity_bounds(-0.5, 0.5))
            .population_size(12)
            .seed(8)
            .build()
            .unwrap();
        let mut iterations = optimizer.iterations(&mut task);
        for report in iterations.by_ref() {
            report.unwrap();
        }
        let generation = iterations.into_generation().unwrap();
        for velocity in &generation.state.velocities {
            assert!(velocity.iter().all(|v| (-0.5..=0.5).contains(v)));
        }
        for (idx, (_, fitness)) in generation.population.iter().enumerate() {
            assert!(generation.state.personal_best_fitness[idx] <= fitness);
        }
    }

    #[test]
    fn unbounded_velocities_are_accepted() {
        let pso = ParticleSwarm::new().velocity_bounds(f64::NEG_INFINITY, f64::INFINITY);
        assert!(pso.validate().is_ok());
        assert!(!pso.bounded_velocity());
        assert!(ParticleSwarm::new()
            .velocity_bounds(1.0, -1.0)
            .validate()
            .is_err());
        assert!(ParticleSwarm::new().inertia(-0.1).validate().is_err());
    }

    #[test]
    fn converges_on_sphere() {
        let problem = Benchmark::new(BenchmarkKind::Sphere, 2).unwrap();
        let mut task = Task::builder(problem).max_evals(2_000).build().unwrap();
        let mut optimizer = Optimizer::builder(ParticleSwarm::new())
            .seed(21)
            .build()
            .unwrap();
        let outcome = optimizer.run(&mut task).unwrap();
        assert!(outcome.best_fitness < 1e-2);
    }
}
