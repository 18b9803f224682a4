//! Strategies that bring out-of-bounds coordinates back into the box.
//!
//! Every strategy mutates the candidate in place and leaves coordinates that
//! already satisfy `lower[i] <= x[i] <= upper[i]` untouched. For finite input
//! the result always lies inside the bounds.
//!
//! Any closure with the signature
//! `Fn(&mut [f64], &[f64], &[f64], &mut dyn RngCore)` is also a repair
//! strategy.

use crate::util::uniform;
use rand::RngCore;

/// Repairs a candidate against per-coordinate bounds.
///
/// # Examples
/// ```
/// use swarmlab::ops::{Limit, RepairOperator};
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// let mut x = [10.0, -10.0];
/// Limit.repair(&mut x, &[-5.0, -5.0], &[5.0, 5.0], &mut rng);
/// assert_eq!(x, [5.0, -5.0]);
/// ```
pub trait RepairOperator: Send + Sync {
    /// Moves every coordinate of `x` into `[lower[i], upper[i]]`.
    fn repair(&self, x: &mut [f64], lower: &[f64], upper: &[f64], rng: &mut dyn RngCore);
}

impl<F> RepairOperator for F
where
    F: Fn(&mut [f64], &[f64], &[f64], &mut dyn RngCore) + Send + Sync,
{
    fn repair(&self, x: &mut [f64], lower: &[f64], upper: &[f64], rng: &mut dyn RngCore) {
        self(x, lower, upper, rng);
    }
}

/// Clamps each coordinate to the nearest bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limit;

impl RepairOperator for Limit {
    fn repair(&self, x: &mut [f64], lower: &[f64], upper: &[f64], _rng: &mut dyn RngCore) {
        for (value, (&low, &high)) in x.iter_mut().zip(lower.iter().zip(upper)) {
            *value = value.clamp(low, high);
        }
    }
}

/// Sends a coordinate below `lower` to `upper` and one above `upper` to
/// `lower`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LimitInverse;

impl RepairOperator for LimitInverse {
    fn repair(&self, x: &mut [f64], lower: &[f64], upper: &[f64], _rng: &mut dyn RngCore) {
        for (value, (&low, &high)) in x.iter_mut().zip(lower.iter().zip(upper)) {
            if *value < low {
                *value = high;
            } else if *value > high {
                *value = low;
            }
        }
    }
}

/// Mirrors the overshoot back across the violated bound, saturating at the
/// opposite bound (Wang's repair).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Wang;

impl RepairOperator for Wang {
    fn repair(&self, x: &mut [f64], lower: &[f64], upper: &[f64], _rng: &mut dyn RngCore) {
        for (value, (&low, &high)) in x.iter_mut().zip(lower.iter().zip(upper)) {
            if *value < low {
                *value = high.min(2.0 * low - *value);
            } else if *value > high {
                *value = low.max(2.0 * high - *value);
            }
        }
    }
}

/// Redraws each offending coordinate uniformly inside its bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RandomReinit;

impl RepairOperator for RandomReinit {
    fn repair(&self, x: &mut [f64], lower: &[f64], upper: &[f64], rng: &mut dyn RngCore) {
        for (value, (&low, &high)) in x.iter_mut().zip(lower.iter().zip(upper)) {
            if *value < low || *value > high {
                *value = uniform(low, high, rng);
            }
        }
    }
}

/// Wraps an offending coordinate into the box modulo its range:
/// `lower + x mod (upper - lower)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reflect;

impl RepairOperator for Reflect {
    fn repair(&self, x: &mut [f64], lower: &[f64], upper: &[f64], _rng: &mut dyn RngCore) {
        for (value, (&low, &high)) in x.iter_mut().zip(lower.iter().zip(upper)) {
            if *value < low || *value > high {
                let range = high - low;
                *value = if range > 0.0 {
                    // rem_euclid may round up to `range` itself.
                    (low + value.rem_euclid(range)).min(high)
                } else {
                    low
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const LOWER: [f64; 4] = [-5.0, -5.0, 0.0, 1.0];
    const UPPER: [f64; 4] = [5.0, 5.0, 2.0, 1.0];

    fn in_bounds(x: &[f64]) -> bool {
        x.iter()
            .zip(LOWER.iter().zip(&UPPER))
            .all(|(v, (l, u))| l <= v && v <= u)
    }

    fn strategies() -> Vec<Box<dyn RepairOperator>> {
        vec![
            Box::new(Limit),
            Box::new(LimitInverse),
            Box::new(Wang),
            Box::new(RandomReinit),
            Box::new(Reflect),
        ]
    }

    #[test]
    fn every_strategy_restores_bounds() {
        let mut rng = StdRng::seed_from_u64(31);
        let inputs = [
            [10.0, -10.0, 7.5, 3.0],
            [-1e9, 1e9, -0.5, -4.0],
            [5.0, -5.0, 2.0, 1.0],
            [123.4, -0.1, 2.000_001, 0.999],
        ];
        for strategy in strategies() {
            for input in inputs {
                let mut x = input;
                strategy.repair(&mut x, &LOWER, &UPPER, &mut rng);
                assert!(in_bounds(&x), "{x:?}");
            }
        }
    }

    #[test]
    fn in_bounds_input_is_untouched() {
        let mut rng = StdRng::seed_from_u64(32);
        for strategy in strategies() {
            let mut x = [0.5, -4.0, 1.0, 1.0];
            strategy.repair(&mut x, &LOWER, &UPPER, &mut rng);
            assert_eq!(x, [0.5, -4.0, 1.0, 1.0]);
        }
    }

    #[test]
    fn limit_clamps() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut x = [10.0, -10.0];
        Limit.repair(&mut x, &[-5.0, -5.0], &[5.0, 5.0], &mut rng);
        assert_eq!(x, [5.0, -5.0]);
    }

    #[test]
    fn limit_inverse_swaps_sides() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut x = [10.0, -10.0];
        LimitInverse.repair(&mut x, &[-5.0, -5.0], &[5.0, 5.0], &mut rng);
        assert_eq!(x, [-5.0, 5.0]);
    }

    #[test]
    fn wang_mirrors_with_saturation() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut x = [6.0, -7.0, 30.0];
        Wang.repair(&mut x, &[-5.0; 3], &[5.0; 3], &mut rng);
        assert_eq!(x, [4.0, -3.0, -5.0]);
    }

    #[test]
    fn reflect_wraps_by_range() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut x = [12.0, -3.0];
        Reflect.repair(&mut x, &[0.0, 0.0], &[10.0, 10.0], &mut rng);
        assert_eq!(x, [2.0, 7.0]);
    }

    #[test]
    fn closures_are_repair_strategies() {
        let midpoint = |x: &mut [f64], lower: &[f64], upper: &[f64], _: &mut dyn RngCore| {
            for (value, (l, u)) in x.iter_mut().zip(lower.iter().zip(upper)) {
                if *value < *l || *value > *u {
                    *value = (l + u) / 2.0;
                }
            }
        };
        let mut rng = StdRng::seed_from_u64(0);
        let mut x = [9.0];
        midpoint.repair(&mut x, &[0.0], &[2.0], &mut rng);
        assert_eq!(x, [1.0]);
    }
}
