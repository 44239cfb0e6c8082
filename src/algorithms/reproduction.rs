//! Reproduction policy
//!
//! The next generation is built from overlapping rank slices of the sorted
//! population, so the best genotypes survive in several copies:
//!
//! | slice | ranks |
//! |-------|-------|
//! | top 2% | `[0, 0.02 N)` |
//! | top 3% | `[0, 0.03 N)` |
//! | top 25% | `[0, 0.25 N)` |
//! | top 25% again | `[0, 0.25 N)` |
//! | middle | `[0.25 N, 0.70 N)` |
//!
//! Slice bounds are rounded down. The concatenation is truncated to N, or
//! padded to N by cycling through the ranks from the top. Each copy is then
//! either mutated or mated with a random member of the current population.

use std::ops::Range;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::genome::bounds::ParameterSpace;
use crate::genome::genotype::{Genotype, DEFAULT_MUTATION_SIGMA};
use crate::population::population::Population;

/// Rank fractions `(start, end)` of the slices copied into the next generation
pub const SLICES: [(f64, f64); 5] = [
    (0.0, 0.02),
    (0.0, 0.03),
    (0.0, 0.25),
    (0.0, 0.25),
    (0.25, 0.70),
];

/// Rank ranges of the copied slices for a population of `size`
pub fn slice_ranges(size: usize) -> Vec<Range<usize>> {
    let bound = |fraction: f64| ((size as f64 * fraction) as usize).min(size);
    SLICES
        .iter()
        .map(|&(start, end)| bound(start)..bound(end))
        .collect()
}

/// Copy the slices of a sorted population and fit the result to its size
///
/// The returned copies still carry their parents' fitness. Rounded-down
/// slices never cover more than `size` ranks, so the truncation only guards
/// against a change to `SLICES`.
pub fn select_survivors(sorted: &[Genotype]) -> Vec<Genotype> {
    let size = sorted.len();
    let mut next: Vec<Genotype> = slice_ranges(size)
        .into_iter()
        .flat_map(|range| sorted[range].iter().cloned())
        .collect();

    next.truncate(size);
    let mut rank = 0;
    while next.len() < size {
        next.push(sorted[rank % size].clone());
        rank += 1;
    }
    next
}

/// How copies are varied before entering the next generation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReproductionPolicy {
    /// Probability a copy is mutated rather than mated
    pub mutation_probability: f64,
    /// Mutation step as a fraction of each parameter's range
    pub mutation_sigma: f64,
}

impl Default for ReproductionPolicy {
    fn default() -> Self {
        Self {
            mutation_probability: 0.75,
            mutation_sigma: DEFAULT_MUTATION_SIGMA,
        }
    }
}

impl ReproductionPolicy {
    /// Build the next generation from a sorted population
    ///
    /// Mating partners are drawn from `population` as it is now, before it
    /// is replaced.
    pub fn next_generation<R: Rng>(
        &self,
        population: &Population,
        space: &ParameterSpace,
        rng: &mut R,
    ) -> Vec<Genotype> {
        let mut next = select_survivors(population.genotypes());
        for genotype in next.iter_mut() {
            if rng.gen::<f64>() < self.mutation_probability {
                genotype.mutate_with_sigma(space, self.mutation_sigma, rng);
            } else if let Some(partner) = population.pick_random(rng) {
                genotype.mate_with(partner, rng);
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::bounds::Bounds;
    use crate::genome::genotype::ParameterMap;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ranked(size: usize) -> Vec<Genotype> {
        (0..size)
            .map(|rank| {
                let mut g = Genotype::new(ParameterMap::from([("rank".to_string(), rank as f64)]));
                g.set_fitness(1.0 - rank as f64 / size as f64);
                g
            })
            .collect()
    }

    fn ranks(genotypes: &[Genotype]) -> Vec<usize> {
        genotypes
            .iter()
            .map(|g| g.get("rank").unwrap() as usize)
            .collect()
    }

    #[test]
    fn test_slice_ranges_for_hundred() {
        let ranges = slice_ranges(100);
        assert_eq!(ranges, vec![0..2, 0..3, 0..25, 0..25, 25..70]);
        let total: usize = ranges.iter().map(|r| r.len()).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_survivors_for_hundred() {
        let survivors = select_survivors(&ranked(100));
        assert_eq!(survivors.len(), 100);

        let r = ranks(&survivors);
        assert_eq!(&r[..5], &[0, 1, 0, 1, 2]);
        assert_eq!(r[5], 0);
        assert_eq!(r[30], 0);
        assert_eq!(r[55], 25);
        assert_eq!(r[99], 69);
        // the best genotype survives four times
        assert_eq!(r.iter().filter(|&&x| x == 0).count(), 4);
    }

    #[test]
    fn test_survivors_pad_small_population() {
        // 0.02 * 7 and 0.03 * 7 round down to empty slices
        let ranges = slice_ranges(7);
        assert_eq!(ranges, vec![0..0, 0..0, 0..1, 0..1, 1..4]);

        let survivors = select_survivors(&ranked(7));
        assert_eq!(ranks(&survivors), vec![0, 0, 1, 2, 3, 0, 1]);
    }

    #[test]
    fn test_survivors_pad_when_slices_fall_short() {
        // 0.25 * 4 = 1, 0.7 * 4 = 2: 0 + 0 + 1 + 1 + 1 = 3, padded by one
        assert_eq!(ranks(&select_survivors(&ranked(4))), vec![0, 0, 1, 0]);

        // 0.03 * 34 = 1, 0.25 * 34 = 8, 0.7 * 34 = 23: 0 + 1 + 8 + 8 + 15 = 32
        assert_eq!(select_survivors(&ranked(34)).len(), 34);

        // 0.02 * 50 = 1: 1 + 1 + 12 + 12 + 23 = 49, padded by one
        let survivors = select_survivors(&ranked(50));
        assert_eq!(survivors.len(), 50);
        assert_eq!(ranks(&survivors)[49], 0);
    }

    #[test]
    fn test_slice_total_never_exceeds_size() {
        for size in 1..1000 {
            let total: usize = slice_ranges(size).iter().map(|r| r.len()).sum();
            assert!(total <= size, "slices cover {} ranks of {}", total, size);
        }
    }

    #[test]
    fn test_slices_never_exceed_size() {
        for size in 1..300 {
            let survivors = select_survivors(&ranked(size));
            assert_eq!(survivors.len(), size);
        }
    }

    #[test]
    fn test_next_generation_keeps_size_and_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let space = ParameterSpace::new()
            .with("threshold", (0.5, 1.0))
            .with("name", Bounds::unit());
        let mut population = Population::new(20);
        population.create(&space, &mut rng);
        for (i, g) in population.iter_mut().enumerate() {
            g.set_fitness(i as f64 / 20.0);
        }
        population.sort();
        let before: Vec<Genotype> = population.genotypes().to_vec();

        let next = ReproductionPolicy::default().next_generation(&population, &space, &mut rng);

        assert_eq!(next.len(), 20);
        assert_eq!(population.genotypes(), before.as_slice());
        for g in &next {
            assert!(!g.is_evaluated());
            for (name, bounds) in space.iter() {
                assert!(bounds.contains(g.get(name).unwrap()));
            }
        }
    }
}
