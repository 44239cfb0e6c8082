//! Informativeness of a record pair
//!
//! A scorer turns the number of genotypes that called a pair a match into a
//! score; the pairs with the highest scores are the ones worth asking about.

/// Scores a pair from the count of genotypes that matched it
pub trait Scorer: Send + Sync {
    /// Higher scores are asked about first
    fn compute_score(&self, count: usize) -> usize;
}

/// Prefers pairs most of the population already believes match
///
/// Used in the first generation, so the ground truth gains some confirmed
/// matches before exploration starts.
#[derive(Clone, Copy, Debug, Default)]
pub struct FindCorrectScorer;

impl Scorer for FindCorrectScorer {
    fn compute_score(&self, count: usize) -> usize {
        count
    }
}

/// Prefers pairs the population disagrees on
///
/// `(N - count) * count` peaks when half the population says match.
#[derive(Clone, Copy, Debug)]
pub struct DisagreementScorer {
    population_size: usize,
}

impl DisagreementScorer {
    /// Create a scorer for a population of the given size
    pub fn new(population_size: usize) -> Self {
        Self { population_size }
    }
}

impl Scorer for DisagreementScorer {
    fn compute_score(&self, count: usize) -> usize {
        self.population_size.saturating_sub(count) * count
    }
}

impl<F> Scorer for F
where
    F: Fn(usize) -> usize + Send + Sync,
{
    fn compute_score(&self, count: usize) -> usize {
        self(count)
    }
}

/// The scorer for a generation: agreement first, disagreement afterwards
pub fn scorer_for_generation(generation: usize, population_size: usize) -> Box<dyn Scorer> {
    if generation == 0 {
        Box::new(FindCorrectScorer)
    } else {
        Box::new(DisagreementScorer::new(population_size))
    }
}
