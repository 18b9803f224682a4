//! Ready-made metaheuristics.
//!
//! Every type here implements [`crate::Algorithm`] and is driven by
//! [`crate::Optimizer`]. Hyperparameters are set with chained setters and
//! checked when the optimizer is built.

mod ba;
mod de;
mod fa;
mod ga;
mod gwo;
mod hc;
mod pso;
mod sa;

pub use ba::BatAlgorithm;
pub use de::{DifferentialEvolution, Strategy};
pub use fa::FireflyAlgorithm;
pub use ga::{GeneticAlgorithm, Operators};
pub use gwo::{GreyWolfOptimizer, Pack, Wolf};
pub use hc::HillClimbing;
pub use pso::{ParticleSwarm, SwarmState};
pub use sa::{Cooling, SimulatedAnnealing};
