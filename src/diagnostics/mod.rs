//! Diagnostics and statistics
//!
//! This module provides statistics collection for tuning runs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EvoResult, EvolutionError};
use crate::genome::genotype::ParameterMap;
use crate::ground_truth::link::RecordPair;
use crate::population::population::Population;

/// Statistics for a single generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation number
    pub generation: usize,
    /// Best fitness in this generation
    pub best_fitness: f64,
    /// Worst fitness in this generation
    pub worst_fitness: f64,
    /// Mean fitness
    pub mean_fitness: f64,
    /// Every genotype's fitness, best first
    pub fitness_values: Vec<f64>,
    /// Best fitness seen in any generation so far
    pub best_ever_fitness: f64,
    /// Genotypes whose evaluation failed and scored zero
    pub evaluation_failures: usize,
    /// Oracle questions answered this generation
    pub questions_asked: usize,
    /// Directly asserted ground-truth facts after this generation
    pub ground_truth_size: usize,
    /// Time spent on evaluation (ms)
    pub evaluation_ms: f64,
}

impl GenerationStats {
    /// Compute statistics from a sorted, evaluated population
    pub fn from_population(population: &Population, generation: usize) -> Self {
        let fitness_values = population.fitness_values();
        let best = fitness_values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let worst = fitness_values.iter().copied().fold(f64::INFINITY, f64::min);

        Self {
            generation,
            best_fitness: if fitness_values.is_empty() { 0.0 } else { best },
            worst_fitness: if fitness_values.is_empty() { 0.0 } else { worst },
            mean_fitness: population.mean_fitness().unwrap_or(0.0),
            fitness_values,
            best_ever_fitness: 0.0,
            evaluation_failures: 0,
            questions_asked: 0,
            ground_truth_size: 0,
            evaluation_ms: 0.0,
        }
    }

    /// Set evaluation time
    pub fn with_evaluation_time(mut self, duration: Duration) -> Self {
        self.evaluation_ms = duration.as_secs_f64() * 1000.0;
        self
    }
}

/// Statistics collector for an entire run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Statistics per generation
    pub generations: Vec<GenerationStats>,
    /// Total runtime in milliseconds
    pub total_runtime_ms: f64,
}

impl EvolutionStats {
    /// Create a new stats collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a generation's statistics
    pub fn record(&mut self, stats: GenerationStats) {
        self.generations.push(stats);
    }

    /// Get the number of generations recorded
    pub fn num_generations(&self) -> usize {
        self.generations.len()
    }

    /// Best-ever fitness after each generation
    pub fn best_ever_history(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.best_ever_fitness).collect()
    }

    /// Best fitness of each generation
    pub fn best_fitness_history(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.best_fitness).collect()
    }

    /// Mean fitness of each generation
    pub fn mean_fitness_history(&self) -> Vec<f64> {
        self.generations.iter().map(|g| g.mean_fitness).collect()
    }

    /// Total oracle questions answered
    pub fn total_questions(&self) -> usize {
        self.generations.iter().map(|g| g.questions_asked).sum()
    }
}

/// Outcome of a tuning run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TuningResult {
    /// Parameters of the best configuration found
    ///
    /// Under active learning this is the top genotype of the last generation,
    /// scored against the final ground truth.
    pub best_configuration: ParameterMap,
    /// Fitness of `best_configuration` when it was evaluated
    pub best_fitness: f64,
    /// Highest fitness reached in any generation
    pub best_ever_fitness: f64,
    /// Generations run
    pub generations: usize,
    /// Whether oracle questions were asked
    pub active_learning: bool,
    /// Every pair the oracle answered, in order
    pub asked_pairs: Vec<RecordPair>,
    /// Per-generation statistics
    pub stats: EvolutionStats,
}

impl TuningResult {
    /// Serialize the result as pretty-printed JSON
    pub fn to_json(&self) -> EvoResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| EvolutionError::Serialization(e.to_string()))
    }
}

pub mod prelude {
    pub use super::{EvolutionStats, GenerationStats, TuningResult};
}
