//! Problem abstractions, repair strategies and variation operators.
//!
//! The traits here are the seams between user code and the optimizers:
//! [`Problem`] describes what is optimised, [`RepairOperator`] keeps
//! candidates inside the box, and the crossover, mutation and selection
//! traits are the pluggable parts of [`crate::algorithms::GeneticAlgorithm`].

pub mod crossover;
pub mod mutation;
pub mod problem;
pub mod repair;
pub mod selection;

use thiserror::Error;

pub use crossover::{BlendAlphaCrossover, CrossoverOperator, SimulatedBinaryCrossover};
pub use mutation::{GaussianMutation, MutationOperator, PolynomialMutation};
pub use problem::{
    validate_bound_arrays, FnProblem, Problem, ProblemBounds, ProblemError, ProblemResult,
};
pub use repair::{Limit, LimitInverse, RandomReinit, Reflect, RepairOperator, Wang};
pub use selection::{SelectionOperator, TournamentSelection};

/// Errors raised while configuring a variation operator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OperatorError {
    /// A distribution index was non-positive or not finite.
    #[error("{operator} distribution index must be positive (received {value})")]
    InvalidDistributionIndex {
        /// Operator that rejected the value.
        operator: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// A probability fell outside `[0, 1]`.
    #[error("{operator} probability must be within [0, 1] (received {value})")]
    InvalidProbability {
        /// Operator that rejected the value.
        operator: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// Any other scalar parameter was out of range.
    #[error("{operator} parameter `{parameter}` is invalid (received {value})")]
    InvalidParameter {
        /// Operator that rejected the value.
        operator: &'static str,
        /// Name of the parameter.
        parameter: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// Tournament selection needs at least one contestant.
    #[error("tournament size must be at least one (received {0})")]
    InvalidTournamentSize(usize),
    /// Lower and upper bound vectors differ in length.
    #[error("bound vectors differ in length (lower: {lower}, upper: {upper})")]
    BoundsLengthMismatch {
        /// Number of lower bounds.
        lower: usize,
        /// Number of upper bounds.
        upper: usize,
    },
}

pub(crate) fn check_bound_lengths(lower: &[f64], upper: &[f64]) -> Result<(), OperatorError> {
    if lower.len() != upper.len() {
        return Err(OperatorError::BoundsLengthMismatch {
            lower: lower.len(),
            upper: upper.len(),
        });
    }
    Ok(())
}

pub(crate) fn check_probability(operator: &'static str, value: f64) -> Result<(), OperatorError> {
    if !(value.is_finite() && (0.0..=1.0).contains(&value)) {
        return Err(OperatorError::InvalidProbability { operator, value });
    }
    Ok(())
}
