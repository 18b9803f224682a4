//! Crossover operators that recombine two parent vectors.

use crate::ops::OperatorError;
use crate::util::{random_unit, uniform};
use rand::RngCore;
use std::sync::Arc;

/// Produces two offspring by mixing the coordinates of two parents.
///
/// # Examples
/// ```
/// use swarmlab::ops::CrossoverOperator;
/// use rand::SeedableRng;
///
/// struct Midpoint;
///
/// impl CrossoverOperator for Midpoint {
///     fn crossover(&self, a: &[f64], b: &[f64], _rng: &mut dyn rand::RngCore) -> (Vec<f64>, Vec<f64>) {
///         let mid: Vec<f64> = a.iter().zip(b).map(|(x, y)| 0.5 * (x + y)).collect();
///         (mid.clone(), mid)
///     }
/// }
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// let (first, second) = Midpoint.crossover(&[0.0, 1.0], &[2.0, 3.0], &mut rng);
/// assert_eq!(first, vec![1.0, 2.0]);
/// assert_eq!(first, second);
/// ```
pub trait CrossoverOperator: Send + Sync {
    /// Applies crossover to the parents and returns their offspring.
    fn crossover(
        &self,
        parent_a: &[f64],
        parent_b: &[f64],
        rng: &mut dyn RngCore,
    ) -> (Vec<f64>, Vec<f64>);
}

impl<T: CrossoverOperator + ?Sized> CrossoverOperator for Arc<T> {
    fn crossover(
        &self,
        parent_a: &[f64],
        parent_b: &[f64],
        rng: &mut dyn RngCore,
    ) -> (Vec<f64>, Vec<f64>) {
        (**self).crossover(parent_a, parent_b, rng)
    }
}

/// Simulated binary crossover (Deb and Agrawal).
///
/// Offspring are spread around the parents with a polynomial distribution
/// whose sharpness grows with the distribution index.
#[derive(Debug, Clone)]
pub struct SimulatedBinaryCrossover {
    distribution_index: f64,
}

impl SimulatedBinaryCrossover {
    /// Creates a new SBX operator.
    ///
    /// # Errors
    /// Returns [`OperatorError::InvalidDistributionIndex`] when the provided
    /// distribution index is non-positive or not finite.
    pub fn new(distribution_index: f64) -> Result<Self, OperatorError> {
        if !(distribution_index.is_finite() && distribution_index > 0.0) {
            return Err(OperatorError::InvalidDistributionIndex {
                operator: "sbx",
                value: distribution_index,
            });
        }
        Ok(Self { distribution_index })
    }

    /// Distribution index used for the spread factor.
    #[must_use]
    pub fn distribution_index(&self) -> f64 {
        self.distribution_index
    }

    fn spread_factor(&self, rng: &mut dyn RngCore) -> f64 {
        let exponent = 1.0 / (self.distribution_index + 1.0);
        let u = random_unit(rng);
        if u <= 0.5 {
            (2.0 * u).powf(exponent)
        } else {
            (2.0 * (1.0 - u)).powf(-exponent)
        }
    }
}

impl CrossoverOperator for SimulatedBinaryCrossover {
    fn crossover(
        &self,
        parent_a: &[f64],
        parent_b: &[f64],
        rng: &mut dyn RngCore,
    ) -> (Vec<f64>, Vec<f64>) {
        parent_a
            .iter()
            .zip(parent_b)
            .map(|(&a, &b)| {
                if (a - b).abs() < f64::EPSILON {
                    return (a, b);
                }
                let beta = self.spread_factor(rng);
                (
                    0.5 * ((1.0 + beta) * a + (1.0 - beta) * b),
                    0.5 * ((1.0 - beta) * a + (1.0 + beta) * b),
                )
            })
            .unzip()
    }
}

/// Blend crossover (BLX-alpha): each child coordinate is drawn uniformly from
/// the parents' interval widened by `alpha` times its length on both sides.
#[derive(Debug, Clone)]
pub struct BlendAlphaCrossover {
    alpha: f64,
}

impl BlendAlphaCrossover {
    /// Creates a new BLX-alpha operator.
    ///
    /// # Errors
    /// Returns [`OperatorError::InvalidParameter`] when `alpha` is negative or
    /// not finite.
    pub fn new(alpha: f64) -> Result<Self, OperatorError> {
        if !(alpha.is_finite() && alpha >= 0.0) {
            return Err(OperatorError::InvalidParameter {
                operator: "blx-alpha",
                parameter: "alpha",
                value: alpha,
            });
        }
        Ok(Self { alpha })
    }

    fn sample(&self, a: f64, b: f64, rng: &mut dyn RngCore) -> f64 {
        let (min, max) = if a <= b { (a, b) } else { (b, a) };
        let spread = self.alpha * (max - min);
        uniform(min - spread, max + spread, rng)
    }
}

impl CrossoverOperator for BlendAlphaCrossover {
    fn crossover(
        &self,
        parent_a: &[f64],
        parent_b: &[f64],
        rng: &mut dyn RngCore,
    ) -> (Vec<f64>, Vec<f64>) {
        parent_a
            .iter()
            .zip(parent_b)
            .map(|(&a, &b)| (self.sample(a, b, rng), self.sample(a, b, rng)))
            .unzip()
    }
}
