//! Candidate matcher configurations
//!
//! A [`Genotype`] is one point in the parameter space: a value for every
//! tunable weight or threshold of the matching engine, plus the fitness it
//! scored in the current generation.

use std::collections::BTreeMap;
use std::fmt;

use rand::seq::index;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::genome::bounds::ParameterSpace;

/// Parameter name to value mapping handed to the matching engine
pub type ParameterMap = BTreeMap<String, f64>;

/// Default mutation step, as a fraction of each parameter's range
pub const DEFAULT_MUTATION_SIGMA: f64 = 0.1;

/// One candidate configuration under evolutionary search
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genotype {
    parameters: ParameterMap,
    fitness: Option<f64>,
}

impl Genotype {
    /// Create an unevaluated genotype from explicit parameter values
    pub fn new(parameters: ParameterMap) -> Self {
        Self {
            parameters,
            fitness: None,
        }
    }

    /// Generate a random genotype, uniform within each parameter's bounds
    pub fn generate<R: Rng>(space: &ParameterSpace, rng: &mut R) -> Self {
        let parameters = space
            .iter()
            .map(|(name, bounds)| {
                let value = if bounds.range() > 0.0 {
                    rng.gen_range(bounds.min..=bounds.max)
                } else {
                    bounds.min
                };
                (name.to_string(), value)
            })
            .collect();
        Self::new(parameters)
    }

    /// The parameter mapping
    pub fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    /// Value of a single parameter
    pub fn get(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).copied()
    }

    /// Number of parameters
    pub fn dimension(&self) -> usize {
        self.parameters.len()
    }

    /// Fitness from the current generation, if evaluated
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    /// Check if this genotype has been evaluated
    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// Cache the fitness for this generation
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    /// Forget the cached fitness
    pub fn clear_fitness(&mut self) {
        self.fitness = None;
    }

    /// Perturb a random subset of parameters with the default step size
    pub fn mutate<R: Rng>(&mut self, space: &ParameterSpace, rng: &mut R) {
        self.mutate_with_sigma(space, DEFAULT_MUTATION_SIGMA, rng);
    }

    /// Perturb a random non-empty subset of parameters
    ///
    /// Each chosen parameter receives a Gaussian delta with standard deviation
    /// `sigma_fraction * range` and is clamped back into its bounds.
    /// Parameters unknown to `space` are left as they are.
    pub fn mutate_with_sigma<R: Rng>(
        &mut self,
        space: &ParameterSpace,
        sigma_fraction: f64,
        rng: &mut R,
    ) {
        let n = self.parameters.len();
        if n == 0 {
            return;
        }

        let count = rng.gen_range(1..=n);
        let chosen = index::sample(rng, n, count).into_vec();
        let names: Vec<String> = self.parameters.keys().cloned().collect();

        for i in chosen {
            let name = &names[i];
            let Some(bounds) = space.get(name) else {
                continue;
            };
            let sigma = (sigma_fraction * bounds.range()).abs();
            if sigma <= 0.0 {
                continue;
            }
            if let (Ok(normal), Some(value)) = (Normal::new(0.0, sigma), self.parameters.get_mut(name))
            {
                *value = bounds.clamp(*value + normal.sample(rng));
            }
        }

        self.fitness = None;
    }

    /// Uniform crossover with another genotype
    ///
    /// Every parameter present in both parents takes either parent's value
    /// with equal probability. The parameter set of `self` is preserved.
    pub fn mate_with<R: Rng>(&mut self, other: &Genotype, rng: &mut R) {
        for (name, value) in self.parameters.iter_mut() {
            if let Some(theirs) = other.parameters.get(name) {
                if rng.gen_bool(0.5) {
                    *value = *theirs;
                }
            }
        }
        self.fitness = None;
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (name, value)) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={:.4}", name, value)?;
        }
        write!(f, "]")?;
        if let Some(fitness) = self.fitness {
            write!(f, " f={:.4}", fitness)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::bounds::Bounds;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn space() -> ParameterSpace {
        ParameterSpace::new()
            .with("threshold", (0.5, 1.0))
            .with("name", Bounds::unit())
            .with("email", Bounds::unit())
            .with("phone", (0.0, 0.5))
    }

    #[test]
    fn test_generate_within_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let space = space();
        for _ in 0..50 {
            let g = Genotype::generate(&space, &mut rng);
            assert_eq!(g.dimension(), 4);
            assert!(!g.is_evaluated());
            for (name, bounds) in space.iter() {
                assert!(bounds.contains(g.get(name).unwrap()));
            }
        }
    }

    #[test]
    fn test_generate_is_reproducible() {
        let space = space();
        let a = Genotype::generate(&space, &mut StdRng::seed_from_u64(9));
        let b = Genotype::generate(&space, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_mutate_clamps_and_keeps_names() {
        let mut rng = StdRng::seed_from_u64(3);
        let space = space();
        let mut g = Genotype::generate(&space, &mut rng);
        let names: Vec<String> = g.parameters().keys().cloned().collect();

        for _ in 0..200 {
            g.mutate_with_sigma(&space, 5.0, &mut rng);
        }

        let after: Vec<String> = g.parameters().keys().cloned().collect();
        assert_eq!(names, after);
        for (name, bounds) in space.iter() {
            assert!(bounds.contains(g.get(name).unwrap()));
        }
    }

    #[test]
    fn test_mutate_changes_something_and_resets_fitness() {
        let mut rng = StdRng::seed_from_u64(4);
        let space = space();
        let mut g = Genotype::generate(&space, &mut rng);
        g.set_fitness(0.8);
        let before = g.clone();

        g.mutate(&space, &mut rng);

        assert_ne!(before.parameters(), g.parameters());
        assert_eq!(g.fitness(), None);
    }

    #[test]
    fn test_mutating_clone_leaves_original_alone() {
        let mut rng = StdRng::seed_from_u64(5);
        let space = space();
        let mut original = Genotype::generate(&space, &mut rng);
        original.set_fitness(0.42);
        let snapshot = original.clone();

        let mut clone = original.clone();
        clone.mutate(&space, &mut rng);
        clone.mate_with(&Genotype::generate(&space, &mut rng), &mut rng);

        assert_eq!(original, snapshot);
        assert_eq!(original.fitness(), Some(0.42));
    }

    #[test]
    fn test_mate_with_uses_parent_values() {
        let mut rng = StdRng::seed_from_u64(6);
        let space = space();
        let a = Genotype::generate(&space, &mut rng);
        let b = Genotype::generate(&space, &mut rng);

        let mut child = a.clone();
        child.mate_with(&b, &mut rng);

        for (name, value) in child.parameters() {
            let va = a.get(name).unwrap();
            let vb = b.get(name).unwrap();
            assert!(*value == va || *value == vb);
        }
    }

    #[test]
    fn test_mate_with_ignores_parameters_missing_in_partner() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut a = Genotype::new(ParameterMap::from([
            ("threshold".to_string(), 0.9),
            ("only_a".to_string(), 0.3),
        ]));
        let b = Genotype::new(ParameterMap::from([
            ("threshold".to_string(), 0.6),
            ("only_b".to_string(), 0.1),
        ]));

        for _ in 0..20 {
            a.mate_with(&b, &mut rng);
        }

        assert_eq!(a.get("only_a"), Some(0.3));
        assert_eq!(a.get("only_b"), None);
        assert_eq!(a.dimension(), 2);
    }

    #[test]
    fn test_display() {
        let mut g = Genotype::new(ParameterMap::from([("threshold".to_string(), 0.75)]));
        assert_eq!(g.to_string(), "[threshold=0.7500]");
        g.set_fitness(0.5);
        assert_eq!(g.to_string(), "[threshold=0.7500] f=0.5000");
    }
}
