//! Random sampling and array helpers shared by tasks, operators and
//! algorithms.
//!
//! Every helper draws from a caller-supplied generator so that a run seeded
//! through [`crate::Optimizer`] stays reproducible end to end.

use rand::RngCore;
use std::f64::consts::PI;

#[allow(clippy::cast_precision_loss)]
const RNG_SCALE: f64 = 1.0 / (u64::MAX as f64 + 1.0);

/// Draws a value uniformly from `[0, 1)`.
///
/// # Examples
/// ```
/// use rand::SeedableRng;
/// let mut rng = rand::rngs::StdRng::seed_from_u64(3);
/// let value = swarmlab::util::random_unit(&mut rng);
/// assert!((0.0..1.0).contains(&value));
/// ```
pub fn random_unit(rng: &mut dyn RngCore) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let value = rng.next_u64() as f64;
    value * RNG_SCALE
}

/// Draws a value uniformly from `[lower, upper)`.
pub fn uniform(lower: f64, upper: f64, rng: &mut dyn RngCore) -> f64 {
    lower + random_unit(rng) * (upper - lower)
}

/// Draws one vector with `x[i]` uniform in `[lower[i], upper[i])`.
///
/// # Examples
/// ```
/// use rand::SeedableRng;
/// let mut rng = rand::rngs::StdRng::seed_from_u64(3);
/// let x = swarmlab::util::uniform_vector(&[-1.0, 0.0], &[1.0, 0.5], &mut rng);
/// assert_eq!(x.len(), 2);
/// assert!((-1.0..1.0).contains(&x[0]));
/// assert!((0.0..0.5).contains(&x[1]));
/// ```
pub fn uniform_vector(lower: &[f64], upper: &[f64], rng: &mut dyn RngCore) -> Vec<f64> {
    lower
        .iter()
        .zip(upper)
        .map(|(&low, &high)| uniform(low, high, rng))
        .collect()
}

/// Standard normal sample using the Box-Muller transform.
pub fn normal_sample(rng: &mut dyn RngCore) -> f64 {
    let u1 = loop {
        let sample = random_unit(rng);
        if sample > 0.0 {
            break sample;
        }
    };
    let u2 = random_unit(rng);
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Returns an index in `0..len`.
///
/// # Panics
/// Panics when `len` is zero.
pub fn random_index(len: usize, rng: &mut dyn RngCore) -> usize {
    assert!(len > 0, "cannot draw an index from an empty range");
    #[allow(clippy::cast_possible_truncation)]
    {
        (rng.next_u64() % len as u64) as usize
    }
}

/// Draws `count` distinct indices from `0..len`, never returning `exclude`.
///
/// Callers are responsible for `len` leaving enough candidates; algorithms
/// check this through their minimum population size at build time.
///
/// # Panics
/// Panics when fewer than `count` candidates remain.
///
/// # Examples
/// ```
/// use rand::SeedableRng;
/// let mut rng = rand::rngs::StdRng::seed_from_u64(11);
/// let picks = swarmlab::util::distinct_indices(5, 3, Some(2), &mut rng);
/// assert_eq!(picks.len(), 3);
/// assert!(!picks.contains(&2));
/// ```
pub fn distinct_indices(
    len: usize,
    count: usize,
    exclude: Option<usize>,
    rng: &mut dyn RngCore,
) -> Vec<usize> {
    let mut candidates: Vec<usize> = (0..len).filter(|idx| Some(*idx) != exclude).collect();
    assert!(
        candidates.len() >= count,
        "need {count} distinct indices but only {} are available",
        candidates.len()
    );
    for slot in 0..count {
        let pick = slot + random_index(candidates.len() - slot, rng);
        candidates.swap(slot, pick);
    }
    candidates.truncate(count);
    candidates
}

/// Expands `values` to exactly `dimension` entries.
///
/// A single value is repeated, a shorter list is tiled and a longer list is
/// truncated. Returns `None` when `values` is empty and `dimension > 0`.
///
/// # Examples
/// ```
/// use swarmlab::util::full_array;
/// assert_eq!(full_array(&[2.0], 3), Some(vec![2.0, 2.0, 2.0]));
/// assert_eq!(full_array(&[1.0, 2.0], 3), Some(vec![1.0, 2.0, 1.0]));
/// assert_eq!(full_array(&[1.0, 2.0, 3.0], 2), Some(vec![1.0, 2.0]));
/// assert_eq!(full_array(&[], 2), None);
/// ```
#[must_use]
pub fn full_array(values: &[f64], dimension: usize) -> Option<Vec<f64>> {
    if dimension == 0 {
        return Some(Vec::new());
    }
    if values.is_empty() {
        return None;
    }
    Some(values.iter().copied().cycle().take(dimension).collect())
}

/// Euclidean distance between two equally long vectors.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn uniform_vector_respects_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let lower = [-5.0, 0.0, 10.0];
        let upper = [5.0, 1.0, 10.0];
        for _ in 0..100 {
            let x = uniform_vector(&lower, &upper, &mut rng);
            for ((value, low), high) in x.iter().zip(&lower).zip(&upper) {
                assert!(*low <= *value && *value <= *high);
            }
        }
    }

    #[test]
    fn distinct_indices_are_unique() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let mut picks = distinct_indices(6, 5, Some(0), &mut rng);
            picks.sort_unstable();
            assert_eq!(picks, vec![1, 2, 3, 4, 5]);
        }
    }

    #[test]
    fn normal_sample_has_plausible_moments() {
        let mut rng = StdRng::seed_from_u64(9);
        let samples: Vec<f64> = (0..20_000).map(|_| normal_sample(&mut rng)).collect();
        #[allow(clippy::cast_precision_loss)]
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let var = samples.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / n;
        assert!(mean.abs() < 0.05);
        assert!((var - 1.0).abs() < 0.05);
    }

    #[test]
    fn seeded_draws_repeat() {
        let mut a = StdRng::seed_from_u64(77);
        let mut b = StdRng::seed_from_u64(77);
        for _ in 0..10 {
            assert_eq!(random_unit(&mut a).to_bits(), random_unit(&mut b).to_bits());
        }
    }
}
