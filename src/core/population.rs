//! Index-stable population container with an aligned fitness vector.

use crate::core::experiment::population_diversity_by;
use crate::core::Member;
use thiserror::Error;

/// Error returned when members and fitness values do not line up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PopulationError {
    /// The two vectors have different lengths.
    #[error("population has {members} members but {fitness} fitness values")]
    Misaligned {
        /// Number of members provided.
        members: usize,
        /// Number of fitness values provided.
        fitness: usize,
    },
    /// The population does not hold the configured number of members.
    #[error("expected a population of {expected} but found {found}")]
    WrongSize {
        /// Configured population size.
        expected: usize,
        /// Number of members present.
        found: usize,
    },
}

/// Members and their direction-adjusted fitness, kept index aligned.
///
/// The container never reorders or flattens its members: slot `i` of
/// [`Population::members`] always pairs with slot `i` of
/// [`Population::fitness`].
///
/// # Examples
/// ```
/// use swarmlab::Population;
///
/// let mut population = Population::new(vec![vec![0.0, 1.0], vec![2.0, 3.0]], vec![1.0, 0.5]).unwrap();
/// assert_eq!(population.len(), 2);
/// assert_eq!(population.best_index(), Some(1));
///
/// population.replace(0, vec![9.0, 9.0], 0.1);
/// assert_eq!(population.best_index(), Some(0));
/// assert!(Population::new(vec![vec![0.0]], vec![]).is_err());
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Population<M> {
    members: Vec<M>,
    fitness: Vec<f64>,
}

impl<M> Default for Population<M> {
    fn default() -> Self {
        Self {
            members: Vec::new(),
            fitness: Vec::new(),
        }
    }
}

impl<M> Population<M> {
    /// Pairs members with their fitness values.
    ///
    /// # Errors
    /// Returns [`PopulationError::Misaligned`] when the lengths differ.
    pub fn new(members: Vec<M>, fitness: Vec<f64>) -> Result<Self, PopulationError> {
        if members.len() != fitness.len() {
            return Err(PopulationError::Misaligned {
                members: members.len(),
                fitness: fitness.len(),
            });
        }
        Ok(Self { members, fitness })
    }

    /// Creates an empty population with room for `capacity` members.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            members: Vec::with_capacity(capacity),
            fitness: Vec::with_capacity(capacity),
        }
    }

    /// Appends a member.
    pub fn push(&mut self, member: M, fitness: f64) {
        self.members.push(member);
        self.fitness.push(fitness);
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the population has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// All members, in slot order.
    #[must_use]
    pub fn members(&self) -> &[M] {
        &self.members
    }

    /// Fitness values, aligned with [`Self::members`].
    #[must_use]
    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    /// Member in slot `idx`.
    ///
    /// # Panics
    /// Panics when `idx` is out of range.
    #[must_use]
    pub fn member(&self, idx: usize) -> &M {
        &self.members[idx]
    }

    /// Member and fitness in slot `idx`, if it exists.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<(&M, f64)> {
        self.members.get(idx).map(|member| (member, self.fitness[idx]))
    }

    /// Swaps a new member into slot `idx`, returning the previous occupant.
    ///
    /// # Panics
    /// Panics when `idx` is out of range.
    pub fn replace(&mut self, idx: usize, member: M, fitness: f64) -> (M, f64) {
        let previous = std::mem::replace(&mut self.members[idx], member);
        let previous_fitness = std::mem::replace(&mut self.fitness[idx], fitness);
        (previous, previous_fitness)
    }

    /// Iterates over `(member, fitness)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&M, f64)> + '_ {
        self.members.iter().zip(self.fitness.iter().copied())
    }

    /// Splits into members and fitness values.
    #[must_use]
    pub fn into_parts(self) -> (Vec<M>, Vec<f64>) {
        (self.members, self.fitness)
    }

    /// Slot holding the smallest fitness. NaN entries are skipped; the first
    /// slot wins among equals.
    #[must_use]
    pub fn best_index(&self) -> Option<usize> {
        self.fitness
            .iter()
            .enumerate()
            .filter(|(_, value)| !value.is_nan())
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(idx, _)| idx)
    }

    /// Slot indices ordered from best to worst fitness.
    #[must_use]
    pub fn sorted_indices(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| self.fitness[a].total_cmp(&self.fitness[b]));
        order
    }

    /// Mean fitness over the evaluated members.
    ///
    /// Members whose fitness is not finite (such as the `+inf` placeholder
    /// returned once the budget is spent) are left out. `0.0` when no member
    /// qualifies.
    #[must_use]
    pub fn mean_fitness(&self) -> f64 {
        let values = self.finite_fitness();
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / len_as_f64(values.len())
    }

    /// Median fitness over the evaluated members, `0.0` when there are none.
    #[must_use]
    pub fn median_fitness(&self) -> f64 {
        let mut values = self.finite_fitness();
        if values.is_empty() {
            return 0.0;
        }
        values.sort_by(f64::total_cmp);
        let mid = values.len() / 2;
        if values.len() % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.0
        } else {
            values[mid]
        }
    }

    /// Population standard deviation of the evaluated fitness values.
    #[must_use]
    pub fn std_fitness(&self) -> f64 {
        let values = self.finite_fitness();
        if values.len() <= 1 {
            return 0.0;
        }
        let mean = self.mean_fitness();
        let variance = values
            .iter()
            .map(|value| (value - mean) * (value - mean))
            .sum::<f64>()
            / len_as_f64(values.len());
        variance.sqrt()
    }

    fn finite_fitness(&self) -> Vec<f64> {
        self.fitness
            .iter()
            .copied()
            .filter(|value| value.is_finite())
            .collect()
    }
}

impl<M: Member> Population<M> {
    /// Root mean per-coordinate variance of the member positions.
    #[must_use]
    pub fn diversity(&self) -> f64 {
        population_diversity_by(self.members.len(), |idx| self.members[idx].position())
    }
}

impl<M> FromIterator<(M, f64)> for Population<M> {
    fn from_iter<I: IntoIterator<Item = (M, f64)>>(iter: I) -> Self {
        let (members, fitness) = iter.into_iter().unzip();
        Self { members, fitness }
    }
}

fn len_as_f64(len: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        len as f64
    }
}
