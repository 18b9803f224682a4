//! Problem abstractions shared by tasks, operators and algorithms.

use crate::util::full_array;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Convenience alias used by the problem traits.
pub type ProblemResult<T> = Result<T, ProblemError>;

/// Errors produced when a candidate solution or a bound definition is
/// incompatible with a problem.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProblemError {
    /// The candidate contains the wrong number of decision variables.
    #[error("candidate has {found} decision variables but problem expects {expected}")]
    DimensionMismatch {
        /// Number of variables expected by the problem.
        expected: usize,
        /// Number of variables provided by the candidate solution.
        found: usize,
    },
    /// The lower and upper bounds do not align with the expected dimensionality.
    #[error("bounds lengths ({lower}, {upper}) do not match problem dimensionality ({expected})")]
    BoundsLengthMismatch {
        /// Expected dimensionality of the problem.
        expected: usize,
        /// Number of lower bounds provided.
        lower: usize,
        /// Number of upper bounds provided.
        upper: usize,
    },
    /// A lower bound exceeds its upper bound, or one of them is NaN.
    #[error("invalid bounds for dimension {dimension} (lower: {lower}, upper: {upper})")]
    InvalidRange {
        /// Index of the offending coordinate.
        dimension: usize,
        /// Lower bound for that coordinate.
        lower: f64,
        /// Upper bound for that coordinate.
        upper: f64,
    },
    /// The problem declares zero decision variables.
    #[error("problem dimension must be positive")]
    ZeroDimension,
    /// The objective itself reported a failure.
    #[error("evaluation failed: {0}")]
    Evaluation(String),
}

/// Shared domain metadata of a box-constrained problem.
pub trait ProblemBounds {
    /// Returns the number of decision variables handled by the problem.
    fn dimensions(&self) -> usize;

    /// Returns the per-coordinate lower bounds.
    fn lower_bounds(&self) -> &[f64];

    /// Returns the per-coordinate upper bounds.
    fn upper_bounds(&self) -> &[f64];

    /// Returns lower and upper bounds as a tuple for ergonomic destructuring.
    fn bounds(&self) -> (&[f64], &[f64]) {
        (self.lower_bounds(), self.upper_bounds())
    }

    /// Ensures that the bound arrays match the reported dimensionality and
    /// that `lower[i] <= upper[i]` holds everywhere.
    ///
    /// # Errors
    /// Returns [`ProblemError::ZeroDimension`],
    /// [`ProblemError::BoundsLengthMismatch`] or [`ProblemError::InvalidRange`].
    fn validate_bounds(&self) -> ProblemResult<()> {
        validate_bound_arrays(self.dimensions(), self.lower_bounds(), self.upper_bounds())
    }

    /// Ensures that a candidate with the provided length is valid for the problem.
    ///
    /// # Errors
    /// Returns [`ProblemError::DimensionMismatch`] when the candidate contains
    /// the wrong number of decision variables.
    fn validate_candidate_length(&self, candidate_len: usize) -> ProblemResult<()> {
        let expected = self.dimensions();
        if candidate_len != expected {
            return Err(ProblemError::DimensionMismatch {
                expected,
                found: candidate_len,
            });
        }
        Ok(())
    }
}

/// Checks a pair of bound arrays against a dimensionality.
///
/// # Errors
/// See [`ProblemBounds::validate_bounds`].
pub fn validate_bound_arrays(dimension: usize, lower: &[f64], upper: &[f64]) -> ProblemResult<()> {
    if dimension == 0 {
        return Err(ProblemError::ZeroDimension);
    }
    if lower.len() != dimension || upper.len() != dimension {
        return Err(ProblemError::BoundsLengthMismatch {
            expected: dimension,
            lower: lower.len(),
            upper: upper.len(),
        });
    }
    for (idx, (&low, &high)) in lower.iter().zip(upper).enumerate() {
        // Written so that NaN on either side fails.
        if !(low <= high) {
            return Err(ProblemError::InvalidRange {
                dimension: idx,
                lower: low,
                upper: high,
            });
        }
    }
    Ok(())
}

impl<T: ProblemBounds + ?Sized> ProblemBounds for Box<T> {
    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn lower_bounds(&self) -> &[f64] {
        (**self).lower_bounds()
    }

    fn upper_bounds(&self) -> &[f64] {
        (**self).upper_bounds()
    }
}

impl<T: ProblemBounds + ?Sized> ProblemBounds for Arc<T> {
    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn lower_bounds(&self) -> &[f64] {
        (**self).lower_bounds()
    }

    fn upper_bounds(&self) -> &[f64] {
        (**self).upper_bounds()
    }
}

/// A continuous objective to be minimised over a box.
///
/// Implementations only provide [`Problem::objective`]; callers go through
/// [`Problem::evaluate`], which rejects candidates of the wrong length before
/// the objective sees them. Problems are immutable and shared between threads.
///
/// # Examples
/// ```
/// use swarmlab::ops::{Problem, ProblemBounds, ProblemError, ProblemResult};
///
/// struct Sphere {
///     lower: [f64; 2],
///     upper: [f64; 2],
/// }
///
/// impl ProblemBounds for Sphere {
///     fn dimensions(&self) -> usize { 2 }
///     fn lower_bounds(&self) -> &[f64] { &self.lower }
///     fn upper_bounds(&self) -> &[f64] { &self.upper }
/// }
///
/// impl Problem for Sphere {
///     fn objective(&self, x: &[f64]) -> ProblemResult<f64> {
///         Ok(x.iter().map(|value| value * value).sum())
///     }
/// }
///
/// let problem = Sphere { lower: [-5.0, -5.0], upper: [5.0, 5.0] };
/// assert_eq!(problem.evaluate(&[1.0, 2.0]).unwrap(), 5.0);
/// assert!(matches!(
///     problem.evaluate(&[1.0]),
///     Err(ProblemError::DimensionMismatch { expected: 2, found: 1 })
/// ));
/// ```
pub trait Problem: ProblemBounds + Send + Sync {
    /// Computes the raw objective value for a candidate of the right length.
    ///
    /// # Errors
    /// Implementations may return [`ProblemError::Evaluation`] to describe
    /// domain issues.
    fn objective(&self, x: &[f64]) -> ProblemResult<f64>;

    /// Validates the candidate length, then evaluates it.
    ///
    /// # Errors
    /// Returns [`ProblemError::DimensionMismatch`] when `x.len()` differs from
    /// [`ProblemBounds::dimensions`], or whatever the objective reports.
    fn evaluate(&self, x: &[f64]) -> ProblemResult<f64> {
        self.validate_candidate_length(x.len())?;
        self.objective(x)
    }

    /// Human readable name, used in logs and run records.
    fn name(&self) -> &str {
        "problem"
    }
}

impl<T: Problem + ?Sized> Problem for Box<T> {
    fn objective(&self, x: &[f64]) -> ProblemResult<f64> {
        (**self).objective(x)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: Problem + ?Sized> Problem for Arc<T> {
    fn objective(&self, x: &[f64]) -> ProblemResult<f64> {
        (**self).objective(x)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// A problem assembled from a closure and a pair of bound arrays.
///
/// # Examples
/// ```
/// use swarmlab::ops::{FnProblem, Problem, ProblemBounds};
///
/// let problem = FnProblem::new(vec![-1.0; 3], vec![1.0; 3], |x: &[f64]| {
///     x.iter().map(|v| v.abs()).sum()
/// })
/// .unwrap()
/// .with_name("l1");
/// assert_eq!(problem.dimensions(), 3);
/// assert_eq!(problem.name(), "l1");
/// assert_eq!(problem.evaluate(&[1.0, -1.0, 0.5]).unwrap(), 2.5);
/// ```
#[derive(Clone)]
pub struct FnProblem<F> {
    name: String,
    lower: Vec<f64>,
    upper: Vec<f64>,
    objective: F,
}

impl<F> FnProblem<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    /// Builds the problem, taking the dimensionality from `lower`.
    ///
    /// # Errors
    /// Fails when the bound arrays are empty, differ in length or contain a
    /// coordinate with `lower > upper`.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>, objective: F) -> ProblemResult<Self> {
        validate_bound_arrays(lower.len(), &lower, &upper)?;
        Ok(Self {
            name: String::from("problem"),
            lower,
            upper,
            objective,
        })
    }

    /// Builds the problem from scalar or short bound lists, tiled to
    /// `dimension` entries.
    ///
    /// # Errors
    /// Fails when either list is empty or the tiled bounds are invalid.
    pub fn with_dimension(
        dimension: usize,
        lower: &[f64],
        upper: &[f64],
        objective: F,
    ) -> ProblemResult<Self> {
        let tiled_lower = full_array(lower, dimension).ok_or(ProblemError::BoundsLengthMismatch {
            expected: dimension,
            lower: 0,
            upper: upper.len(),
        })?;
        let tiled_upper = full_array(upper, dimension).ok_or(ProblemError::BoundsLengthMismatch {
            expected: dimension,
            lower: lower.len(),
            upper: 0,
        })?;
        validate_bound_arrays(dimension, &tiled_lower, &tiled_upper)?;
        Self::new(tiled_lower, tiled_upper, objective)
    }

    /// Replaces the default name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<F> ProblemBounds for FnProblem<F> {
    fn dimensions(&self) -> usize {
        self.lower.len()
    }

    fn lower_bounds(&self) -> &[f64] {
        &self.lower
    }

    fn upper_bounds(&self) -> &[f64] {
        &self.upper
    }
}

impl<F> Problem for FnProblem<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn objective(&self, x: &[f64]) -> ProblemResult<f64> {
        Ok((self.objective)(x))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> fmt::Debug for FnProblem<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProblem")
            .field("name", &self.name)
            .field("lower", &self.lower)
            .field("upper", &self.upper)
            .finish_non_exhaustive()
    }
}
