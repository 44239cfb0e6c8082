//! Population type
//!
//! This module provides the fixed-size, ordered Population of genotypes.

use rand::Rng;

use crate::error::{EvoResult, EvolutionError};
use crate::genome::bounds::ParameterSpace;
use crate::genome::genotype::{Genotype, ParameterMap};

/// An ordered population of genotypes with a fixed size
#[derive(Clone, Debug)]
pub struct Population {
    /// The genotypes in this population
    genotypes: Vec<Genotype>,
    /// Target size, constant across generations
    size: usize,
    /// Current generation number
    generation: usize,
}

impl Population {
    /// Create an empty population that will hold `size` genotypes
    pub fn new(size: usize) -> Self {
        Self {
            genotypes: Vec::with_capacity(size),
            size,
            generation: 0,
        }
    }

    /// Create a population from existing genotypes; its size becomes theirs
    pub fn from_genotypes(genotypes: Vec<Genotype>) -> Self {
        Self {
            size: genotypes.len(),
            genotypes,
            generation: 0,
        }
    }

    /// Fill the population with random genotypes
    ///
    /// Replaces any existing members.
    pub fn create<R: Rng>(&mut self, space: &ParameterSpace, rng: &mut R) {
        self.genotypes = (0..self.size)
            .map(|_| Genotype::generate(space, rng))
            .collect();
        self.generation = 0;
    }

    /// Target population size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of genotypes currently held
    pub fn len(&self) -> usize {
        self.genotypes.len()
    }

    /// Check if the population is empty
    pub fn is_empty(&self) -> bool {
        self.genotypes.is_empty()
    }

    /// Get the current generation
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Get a genotype by rank
    pub fn get(&self, index: usize) -> Option<&Genotype> {
        self.genotypes.get(index)
    }

    /// Get an iterator over the genotypes
    pub fn iter(&self) -> impl Iterator<Item = &Genotype> {
        self.genotypes.iter()
    }

    /// Get a mutable iterator over the genotypes
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Genotype> {
        self.genotypes.iter_mut()
    }

    /// Get the underlying genotypes
    pub fn genotypes(&self) -> &[Genotype] {
        &self.genotypes
    }

    /// Sort by fitness, best first
    ///
    /// The sort is stable: genotypes with equal fitness keep their relative
    /// order. Unevaluated genotypes go last.
    pub fn sort(&mut self) {
        self.genotypes.sort_by(|a, b| {
            let fa = a.fitness().unwrap_or(f64::NEG_INFINITY);
            let fb = b.fitness().unwrap_or(f64::NEG_INFINITY);
            fb.partial_cmp(&fa).unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    /// Replace every genotype with the next generation
    ///
    /// The new generation must have exactly the population's size.
    pub fn set_new_generation(&mut self, next: Vec<Genotype>) -> EvoResult<()> {
        if next.len() != self.size {
            return Err(EvolutionError::PopulationSize {
                expected: self.size,
                actual: next.len(),
            });
        }
        self.genotypes = next;
        self.generation += 1;
        Ok(())
    }

    /// A uniformly random member of the current population
    pub fn pick_random<R: Rng>(&self, rng: &mut R) -> Option<&Genotype> {
        if self.genotypes.is_empty() {
            return None;
        }
        let i = rng.gen_range(0..self.genotypes.len());
        self.genotypes.get(i)
    }

    /// The evaluated genotype with the highest fitness
    ///
    /// Ties go to the genotype ranked earlier.
    pub fn best(&self) -> Option<&Genotype> {
        self.genotypes
            .iter()
            .filter(|g| g.is_evaluated())
            .fold(None, |best: Option<&Genotype>, g| match best {
                Some(b) if b.fitness() >= g.fitness() => Some(b),
                _ => Some(g),
            })
    }

    /// Parameters of the best genotype
    pub fn best_configuration(&self) -> Option<&ParameterMap> {
        self.best().map(|g| g.parameters())
    }

    /// Fitness of every genotype in rank order (0.0 for unevaluated)
    pub fn fitness_values(&self) -> Vec<f64> {
        self.genotypes
            .iter()
            .map(|g| g.fitness().unwrap_or(0.0))
            .collect()
    }

    /// Compute mean fitness over evaluated genotypes
    pub fn mean_fitness(&self) -> Option<f64> {
        let evaluated: Vec<f64> = self.genotypes.iter().filter_map(|g| g.fitness()).collect();

        if evaluated.is_empty() {
            None
        } else {
            Some(evaluated.iter().sum::<f64>() / evaluated.len() as f64)
        }
    }

    /// Check if all genotypes have been evaluated
    pub fn all_evaluated(&self) -> bool {
        self.genotypes.iter().all(|g| g.is_evaluated())
    }
}

impl std::ops::Index<usize> for Population {
    type Output = Genotype;

    fn index(&self, index: usize) -> &Self::Output {
        &self.genotypes[index]
    }
}
