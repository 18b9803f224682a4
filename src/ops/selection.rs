//! Parent selection for the genetic algorithm.

use crate::ops::OperatorError;
use crate::util::random_index;
use rand::RngCore;
use std::sync::Arc;

/// Picks parents by index from a slice of fitness values.
///
/// Fitness follows the crate-wide convention: smaller is better.
///
/// # Examples
/// ```
/// use swarmlab::ops::SelectionOperator;
/// use rand::SeedableRng;
///
/// struct BestOnly;
///
/// impl SelectionOperator for BestOnly {
///     fn select_index(&self, fitness: &[f64], _rng: &mut dyn rand::RngCore) -> Option<usize> {
///         fitness
///             .iter()
///             .enumerate()
///             .min_by(|(_, a), (_, b)| a.total_cmp(b))
///             .map(|(idx, _)| idx)
///     }
/// }
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// assert_eq!(BestOnly.select_index(&[3.0, 1.0, 2.0], &mut rng), Some(1));
/// assert_eq!(BestOnly.select_pair(&[3.0, 1.0], &mut rng), Some((1, 1)));
/// ```
pub trait SelectionOperator: Send + Sync {
    /// Returns the index of the member to use as a parent, or `None` for an
    /// empty population.
    fn select_index(&self, fitness: &[f64], rng: &mut dyn RngCore) -> Option<usize>;

    /// Convenience helper that samples two parents.
    fn select_pair(&self, fitness: &[f64], rng: &mut dyn RngCore) -> Option<(usize, usize)> {
        let first = self.select_index(fitness, rng)?;
        let second = self.select_index(fitness, rng)?;
        Some((first, second))
    }
}

impl<T: SelectionOperator + ?Sized> SelectionOperator for Arc<T> {
    fn select_index(&self, fitness: &[f64], rng: &mut dyn RngCore) -> Option<usize> {
        (**self).select_index(fitness, rng)
    }
}

/// Tournament selection: the fittest of `size` uniformly drawn contestants
/// wins. NaN fitness never wins against a number.
#[derive(Debug, Clone)]
pub struct TournamentSelection {
    size: usize,
}

impl TournamentSelection {
    /// Creates a tournament selector of the provided size.
    ///
    /// # Errors
    /// Returns [`OperatorError::InvalidTournamentSize`] when `size` is zero.
    pub fn new(size: usize) -> Result<Self, OperatorError> {
        if size == 0 {
            return Err(OperatorError::InvalidTournamentSize(size));
        }
        Ok(Self { size })
    }

    /// Number of contestants per tournament.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }
}

impl SelectionOperator for TournamentSelection {
    fn select_index(&self, fitness: &[f64], rng: &mut dyn RngCore) -> Option<usize> {
        if fitness.is_empty() {
            return None;
        }
        let mut winner = random_index(fitness.len(), rng);
        for _ in 1..self.size {
            let challenger = random_index(fitness.len(), rng);
            if fitness[challenger] < fitness[winner] || fitness[winner].is_nan() {
                winner = challenger;
            }
        }
        Some(winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn large_tournament_prefers_minimum() {
        let operator = TournamentSelection::new(64).unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        let fitness = [5.0, 0.5, 3.0, 9.0];
        let wins = (0..100)
            .filter(|_| operator.select_index(&fitness, &mut rng) == Some(1))
            .count();
        assert!(wins > 95);
    }

    #[test]
    fn empty_population_selects_nothing() {
        let operator = TournamentSelection::new(3).unwrap();
        let mut rng = StdRng::seed_from_u64(22);
        assert_eq!(operator.select_index(&[], &mut rng), None);
        assert_eq!(operator.select_pair(&[], &mut rng), None);
    }

    #[test]
    fn zero_size_is_rejected() {
        assert_eq!(
            TournamentSelection::new(0).unwrap_err(),
            OperatorError::InvalidTournamentSize(0)
        );
    }
}
