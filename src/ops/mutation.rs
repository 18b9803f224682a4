//! Mutation operators that perturb a single vector inside a box.

use crate::ops::{check_bound_lengths, check_probability, OperatorError};
use crate::util::{normal_sample, random_unit};
use rand::RngCore;
use std::sync::Arc;

/// Applies a mutation to a parent vector and returns the perturbed copy.
///
/// # Examples
/// ```
/// use swarmlab::ops::MutationOperator;
/// use rand::SeedableRng;
///
/// struct Shrink(f64);
///
/// impl MutationOperator for Shrink {
///     fn mutate(&self, parent: &[f64], _rng: &mut dyn rand::RngCore) -> Vec<f64> {
///         parent.iter().map(|x| x * self.0).collect()
///     }
/// }
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// assert_eq!(Shrink(0.5).mutate(&[4.0, -2.0], &mut rng), vec![2.0, -1.0]);
/// ```
pub trait MutationOperator: Send + Sync {
    /// Mutates the provided parent.
    fn mutate(&self, parent: &[f64], rng: &mut dyn RngCore) -> Vec<f64>;
}

impl<T: MutationOperator + ?Sized> MutationOperator for Arc<T> {
    fn mutate(&self, parent: &[f64], rng: &mut dyn RngCore) -> Vec<f64> {
        (**self).mutate(parent, rng)
    }
}

/// Polynomial mutation (Deb and Goyal) bounded by a box.
#[derive(Debug, Clone)]
pub struct PolynomialMutation {
    distribution_index: f64,
    probability: f64,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl PolynomialMutation {
    /// Creates a polynomial mutation over `[lower, upper]`.
    ///
    /// # Errors
    /// Returns [`OperatorError`] when the distribution index or probability is
    /// invalid, or when the bound vectors have mismatched lengths.
    pub fn new(
        lower: Vec<f64>,
        upper: Vec<f64>,
        distribution_index: f64,
        probability: f64,
    ) -> Result<Self, OperatorError> {
        if !(distribution_index.is_finite() && distribution_index > 0.0) {
            return Err(OperatorError::InvalidDistributionIndex {
                operator: "polynomial mutation",
                value: distribution_index,
            });
        }
        check_probability("polynomial mutation", probability)?;
        check_bound_lengths(&lower, &upper)?;
        Ok(Self {
            distribution_index,
            probability,
            lower,
            upper,
        })
    }

    /// Per-coordinate mutation probability.
    #[must_use]
    pub fn probability(&self) -> f64 {
        self.probability
    }

    fn perturb(&self, value: f64, lower: f64, upper: f64, rng: &mut dyn RngCore) -> f64 {
        let range = upper - lower;
        if range.abs() < f64::EPSILON {
            return lower;
        }
        let power = self.distribution_index + 1.0;
        let u = random_unit(rng);
        let delta_q = if u <= 0.5 {
            let delta = (value - lower) / range;
            let term = 2.0 * u + (1.0 - 2.0 * u) * (1.0 - delta).powf(power);
            term.powf(1.0 / power) - 1.0
        } else {
            let delta = (upper - value) / range;
            let v = 1.0 - u;
            let term = 2.0 * v + (1.0 - 2.0 * v) * (1.0 - delta).powf(power);
            1.0 - term.powf(1.0 / power)
        };
        let delta_q = if delta_q.is_finite() { delta_q } else { 0.0 };
        (value + delta_q * range).clamp(lower, upper)
    }
}

impl MutationOperator for PolynomialMutation {
    fn mutate(&self, parent: &[f64], rng: &mut dyn RngCore) -> Vec<f64> {
        parent
            .iter()
            .zip(self.lower.iter().zip(&self.upper))
            .map(|(&value, (&lower, &upper))| {
                if random_unit(rng) > self.probability {
                    value
                } else {
                    self.perturb(value, lower, upper, rng)
                }
            })
            .collect()
    }
}

/// Gaussian mutation with per-coordinate clamping.
#[derive(Debug, Clone)]
pub struct GaussianMutation {
    probability: f64,
    sigma: f64,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl GaussianMutation {
    /// Creates a Gaussian mutation operator.
    ///
    /// # Errors
    /// Returns [`OperatorError`] when the bounds mismatch, probability lies
    /// outside `[0, 1]` or `sigma` is non-positive.
    pub fn new(
        lower: Vec<f64>,
        upper: Vec<f64>,
        sigma: f64,
        probability: f64,
    ) -> Result<Self, OperatorError> {
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(OperatorError::InvalidParameter {
                operator: "gaussian mutation",
                parameter: "sigma",
                value: sigma,
            });
        }
        check_probability("gaussian mutation", probability)?;
        check_bound_lengths(&lower, &upper)?;
        Ok(Self {
            probability,
            sigma,
            lower,
            upper,
        })
    }
}

impl MutationOperator for GaussianMutation {
    fn mutate(&self, parent: &[f64], rng: &mut dyn RngCore) -> Vec<f64> {
        parent
            .iter()
            .zip(self.lower.iter().zip(&self.upper))
            .map(|(&value, (&lower, &upper))| {
                if random_unit(rng) > self.probability {
                    value
                } else {
                    (value + normal_sample(rng) * self.sigma).clamp(lower, upper)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn polynomial_mutation_stays_in_bounds() {
        let operator = PolynomialMutation::new(vec![0.0; 3], vec![1.0; 3], 20.0, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(10);
        for _ in 0..200 {
            let child = operator.mutate(&[0.0, 0.5, 1.0], &mut rng);
            assert!(child.iter().all(|value| (0.0..=1.0).contains(value)));
        }
    }

    #[test]
    fn zero_probability_is_identity() {
        let operator = PolynomialMutation::new(vec![-1.0], vec![1.0], 20.0, 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        assert_eq!(operator.mutate(&[0.25], &mut rng), vec![0.25]);
    }

    #[test]
    fn constructors_validate_parameters() {
        assert!(PolynomialMutation::new(vec![0.0], vec![1.0], -1.0, 0.5).is_err());
        assert!(PolynomialMutation::new(vec![0.0], vec![1.0], 20.0, 1.5).is_err());
        assert_eq!(
            GaussianMutation::new(vec![0.0, 0.0], vec![1.0], 0.1, 0.5).unwrap_err(),
            OperatorError::BoundsLengthMismatch { lower: 2, upper: 1 }
        );
    }

    #[test]
    fn gaussian_mutation_stays_within_bounds() {
        let operator = GaussianMutation::new(vec![0.0], vec![1.0], 0.5, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..100 {
            let child = operator.mutate(&[0.5], &mut rng);
            assert!((0.0..=1.0).contains(&child[0]));
        }
    }
}
