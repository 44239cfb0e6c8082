//! Genetic algorithm for tuning a matching engine
//!
//! Each generation evaluates every genotype against the ground truth, sorts
//! the population, asks the oracle about the most informative proposed pairs
//! (active learning only) and breeds the next generation.
//!
//! Active learning is on exactly when no ground truth is supplied. Fitness is
//! then scored optimistically, since almost every proposed pair starts out
//! unknown.

use std::path::PathBuf;
use std::time::Instant;

use rand::Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::active_learning::exemplars::ExemplarsTracker;
use crate::active_learning::oracle::{Oracle, Question, StdioOracle};
use crate::active_learning::scorer::scorer_for_generation;
use crate::algorithms::reproduction::ReproductionPolicy;
use crate::diagnostics::{EvolutionStats, GenerationStats, TuningResult};
use crate::error::{EvoResult, EvolutionError, MatchingError};
use crate::fitness::evaluator::{FMeasure, LinkEvaluator, ScoringMode};
use crate::genome::bounds::ParameterSpace;
use crate::genome::genotype::{Genotype, ParameterMap, DEFAULT_MUTATION_SIGMA};
use crate::ground_truth::link::{Provenance, RecordPair};
use crate::ground_truth::store::GroundTruthStore;
use crate::ground_truth::test_file::load_test_file;
use crate::matching::display::pretty_compare;
use crate::matching::{DataSource, MatchingEngine, ProposedLink};
use crate::population::population::Population;

/// Caption shown above each question
const QUESTION_CAPTION: &str = "Possible match";

/// Run parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of generations to run
    pub generations: usize,
    /// Population size
    pub population_size: usize,
    /// Oracle questions per generation
    pub questions_per_generation: usize,
    /// Non-answers tolerated per generation before questioning stops
    pub skip_limit: usize,
    /// Probability a copy is mutated rather than mated
    pub mutation_probability: f64,
    /// Mutation step as a fraction of each parameter's range
    pub mutation_sigma: f64,
    /// Whether to evaluate in parallel
    pub parallel_evaluation: bool,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            generations: 100,
            population_size: 100,
            questions_per_generation: 10,
            skip_limit: 10,
            mutation_probability: 0.75,
            mutation_sigma: DEFAULT_MUTATION_SIGMA,
            parallel_evaluation: true,
        }
    }
}

/// Builder for [`GeneticAlgorithm`]
///
/// Without ground truth the run uses active learning and needs an oracle.
pub struct GeneticAlgorithmBuilder<E, O> {
    config: GeneticConfig,
    engine: Option<E>,
    oracle: Option<O>,
    space: Option<ParameterSpace>,
    ground_truth: Option<GroundTruthStore>,
    test_file: Option<PathBuf>,
    inference: bool,
}

impl GeneticAlgorithmBuilder<(), StdioOracle> {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: GeneticConfig::default(),
            engine: None,
            oracle: None,
            space: None,
            ground_truth: None,
            test_file: None,
            inference: true,
        }
    }
}

impl Default for GeneticAlgorithmBuilder<(), StdioOracle> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, O> GeneticAlgorithmBuilder<E, O> {
    /// Replace the whole configuration
    pub fn config(mut self, config: GeneticConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of generations
    pub fn generations(mut self, generations: usize) -> Self {
        self.config.generations = generations;
        self
    }

    /// Set the population size
    pub fn population_size(mut self, size: usize) -> Self {
        self.config.population_size = size;
        self
    }

    /// Set the number of oracle questions per generation
    pub fn questions_per_generation(mut self, questions: usize) -> Self {
        self.config.questions_per_generation = questions;
        self
    }

    /// Set how many non-answers end a generation's questions
    pub fn skip_limit(mut self, skips: usize) -> Self {
        self.config.skip_limit = skips;
        self
    }

    /// Set the mutation probability
    pub fn mutation_probability(mut self, probability: f64) -> Self {
        self.config.mutation_probability = probability;
        self
    }

    /// Set the mutation step as a fraction of each parameter's range
    pub fn mutation_sigma(mut self, sigma: f64) -> Self {
        self.config.mutation_sigma = sigma;
        self
    }

    /// Enable or disable parallel evaluation
    pub fn parallel_evaluation(mut self, enabled: bool) -> Self {
        self.config.parallel_evaluation = enabled;
        self
    }

    /// Set the tunable parameters and their ranges
    pub fn parameter_space(mut self, space: ParameterSpace) -> Self {
        self.space = Some(space);
        self
    }

    /// Use a pre-built ground truth
    pub fn ground_truth(mut self, store: GroundTruthStore) -> Self {
        self.ground_truth = Some(store);
        self
    }

    /// Load ground truth from a test file when building
    pub fn test_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.test_file = Some(path.into());
        self
    }

    /// Enable or disable inference over the ground truth
    pub fn inference(mut self, enabled: bool) -> Self {
        self.inference = enabled;
        self
    }

    /// Set the matching engine
    pub fn engine<NewE>(self, engine: NewE) -> GeneticAlgorithmBuilder<NewE, O>
    where
        NewE: MatchingEngine,
    {
        GeneticAlgorithmBuilder {
            config: self.config,
            engine: Some(engine),
            oracle: self.oracle,
            space: self.space,
            ground_truth: self.ground_truth,
            test_file: self.test_file,
            inference: self.inference,
        }
    }

    /// Set the oracle
    pub fn oracle<NewO>(self, oracle: NewO) -> GeneticAlgorithmBuilder<E, NewO>
    where
        NewO: Oracle,
    {
        GeneticAlgorithmBuilder {
            config: self.config,
            engine: self.engine,
            oracle: Some(oracle),
            space: self.space,
            ground_truth: self.ground_truth,
            test_file: self.test_file,
            inference: self.inference,
        }
    }

    /// Ask questions on the process's console
    pub fn console_oracle(self) -> GeneticAlgorithmBuilder<E, StdioOracle> {
        self.oracle(StdioOracle::stdio())
    }
}

impl<E, O> GeneticAlgorithmBuilder<E, O>
where
    E: MatchingEngine,
    O: Oracle,
{
    /// Build the GeneticAlgorithm instance
    ///
    /// Loads the test file, if one was given; failing to load it is fatal.
    pub fn build(self) -> EvoResult<GeneticAlgorithm<E, O>> {
        let config = self.config;
        if config.population_size == 0 {
            return Err(EvolutionError::Configuration(
                "Population size must be positive".to_string(),
            ));
        }
        if config.generations == 0 {
            return Err(EvolutionError::Configuration(
                "At least one generation must be run".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&config.mutation_probability) {
            return Err(EvolutionError::Configuration(format!(
                "Mutation probability {} is not in [0, 1]",
                config.mutation_probability
            )));
        }
        if !(config.mutation_sigma.is_finite() && config.mutation_sigma > 0.0) {
            return Err(EvolutionError::Configuration(format!(
                "Mutation sigma {} must be positive",
                config.mutation_sigma
            )));
        }

        let space = self.space.ok_or_else(|| {
            EvolutionError::Configuration("Parameter space must be specified".to_string())
        })?;
        if space.is_empty() {
            return Err(EvolutionError::Configuration(
                "Parameter space has no parameters".to_string(),
            ));
        }

        let engine = self.engine.ok_or_else(|| {
            EvolutionError::Configuration("Matching engine must be specified".to_string())
        })?;

        let supplied = self.ground_truth.is_some() || self.test_file.is_some();
        let mut store = self.ground_truth.unwrap_or_default();
        store.set_do_inference(self.inference);
        if let Some(path) = &self.test_file {
            load_test_file(path, &mut store)?;
        }

        let active = !supplied;
        if active && self.oracle.is_none() {
            return Err(EvolutionError::Configuration(
                "An oracle must be specified when no ground truth is supplied".to_string(),
            ));
        }

        let mode = if active {
            ScoringMode::Optimistic
        } else {
            ScoringMode::Pessimistic
        };
        let policy = ReproductionPolicy {
            mutation_probability: config.mutation_probability,
            mutation_sigma: config.mutation_sigma,
        };

        Ok(GeneticAlgorithm {
            population: Population::new(config.population_size),
            config,
            engine,
            oracle: self.oracle,
            space,
            store,
            evaluator: LinkEvaluator::new(mode),
            policy,
            active,
            best_ever: 0.0,
            best_genotype: None,
            top_genotype: None,
            asked_pairs: Vec::new(),
            stats: EvolutionStats::new(),
        })
    }
}

/// Outcome of evaluating one genotype
struct Evaluation {
    score: FMeasure,
    links: Vec<ProposedLink>,
}

fn evaluate_genotype<E: MatchingEngine>(
    engine: &E,
    store: &GroundTruthStore,
    evaluator: &LinkEvaluator,
    genotype: &Genotype,
) -> Result<Evaluation, MatchingError> {
    let links = engine.link_records(genotype.parameters())?;
    let score = evaluator.evaluate(&links, store);
    Ok(Evaluation { score, links })
}

/// Genetic algorithm over matching-engine configurations
pub struct GeneticAlgorithm<E, O> {
    config: GeneticConfig,
    engine: E,
    oracle: Option<O>,
    space: ParameterSpace,
    store: GroundTruthStore,
    evaluator: LinkEvaluator,
    policy: ReproductionPolicy,
    population: Population,
    active: bool,
    best_ever: f64,
    best_genotype: Option<Genotype>,
    top_genotype: Option<Genotype>,
    asked_pairs: Vec<RecordPair>,
    stats: EvolutionStats,
}

impl<E, O> GeneticAlgorithm<E, O>
where
    E: MatchingEngine,
    O: Oracle,
{
    /// Index the record set, then run every generation
    pub fn run<R: Rng>(
        &mut self,
        sources: &[&dyn DataSource],
        rng: &mut R,
    ) -> EvoResult<TuningResult> {
        let start_time = Instant::now();

        let records = self.engine.index_all(sources)?;
        tracing::info!(
            records,
            population = self.config.population_size,
            generations = self.config.generations,
            active_learning = self.active,
            "starting tuning run"
        );

        self.population = Population::new(self.config.population_size);
        self.population.create(&self.space, rng);
        self.stats = EvolutionStats::new();

        for generation in 0..self.config.generations {
            let gen_stats = self.evolve(generation, rng)?;
            self.stats.record(gen_stats);
        }

        self.stats.total_runtime_ms = start_time.elapsed().as_secs_f64() * 1000.0;
        self.result()
    }

    /// Run one generation and breed the next
    pub fn evolve<R: Rng>(&mut self, generation: usize, rng: &mut R) -> EvoResult<GenerationStats> {
        let mut tracker = self.active.then(|| {
            ExemplarsTracker::new(scorer_for_generation(generation, self.population.size()))
        });

        let eval_start = Instant::now();
        let evaluations = self.evaluate_population();
        let eval_time = eval_start.elapsed();

        let mut failures = 0;
        for (genotype, evaluation) in self.population.iter_mut().zip(evaluations) {
            match evaluation {
                Ok(evaluation) => {
                    genotype.set_fitness(evaluation.score.f_measure);
                    tracing::debug!(
                        generation,
                        fitness = evaluation.score.f_measure,
                        precision = evaluation.score.precision,
                        recall = evaluation.score.recall,
                        genotype = %genotype,
                        "evaluated genotype"
                    );
                    if let Some(tracker) = tracker.as_mut() {
                        tracker.track_links(&evaluation.links);
                    }
                }
                Err(e) => {
                    failures += 1;
                    genotype.set_fitness(0.0);
                    tracing::warn!(generation, error = %e, "evaluation failed, scoring zero");
                }
            }
        }

        self.population.sort();
        self.update_best_ever(generation)?;

        let mut gen_stats = GenerationStats::from_population(&self.population, generation)
            .with_evaluation_time(eval_time);
        tracing::info!(
            generation,
            best = gen_stats.best_fitness,
            mean = gen_stats.mean_fitness,
            best_ever = self.best_ever,
            "generation evaluated"
        );

        let questions = match &tracker {
            Some(tracker) => self.ask_questions(tracker)?,
            None => 0,
        };

        gen_stats.best_ever_fitness = self.best_ever;
        gen_stats.evaluation_failures = failures;
        gen_stats.questions_asked = questions;
        gen_stats.ground_truth_size = self.store.len();

        let next = self.policy.next_generation(&self.population, &self.space, rng);
        self.population.set_new_generation(next)?;

        Ok(gen_stats)
    }

    fn evaluate_population(&self) -> Vec<Result<Evaluation, MatchingError>> {
        if self.config.parallel_evaluation {
            self.evaluate_parallel()
        } else {
            self.evaluate_sequential()
        }
    }

    fn evaluate_sequential(&self) -> Vec<Result<Evaluation, MatchingError>> {
        let (engine, store, evaluator) = (&self.engine, &self.store, &self.evaluator);
        self.population
            .iter()
            .map(|g| evaluate_genotype(engine, store, evaluator, g))
            .collect()
    }

    /// The oracle need not be `Sync`, so the closure borrows fields, not `self`
    #[cfg(feature = "parallel")]
    fn evaluate_parallel(&self) -> Vec<Result<Evaluation, MatchingError>> {
        let (engine, store, evaluator) = (&self.engine, &self.store, &self.evaluator);
        self.population
            .genotypes()
            .par_iter()
            .map(|g| evaluate_genotype(engine, store, evaluator, g))
            .collect()
    }

    /// Sequential fallback when the `parallel` feature is disabled
    #[cfg(not(feature = "parallel"))]
    fn evaluate_parallel(&self) -> Vec<Result<Evaluation, MatchingError>> {
        self.evaluate_sequential()
    }

    fn update_best_ever(&mut self, generation: usize) -> EvoResult<()> {
        let best = self
            .population
            .best()
            .ok_or(EvolutionError::EmptyPopulation)?;
        let fitness = best.fitness().unwrap_or(0.0);
        self.top_genotype = Some(best.clone());
        if self.best_genotype.is_none() || fitness > self.best_ever {
            if fitness > self.best_ever {
                tracing::info!(generation, fitness, genotype = %best, "new best configuration");
            }
            self.best_ever = self.best_ever.max(fitness);
            self.best_genotype = Some(best.clone());
        }
        Ok(())
    }

    /// Ask the oracle about the most informative unresolved pairs
    ///
    /// Pairs with a known or inferred fact are skipped, as are non-answers.
    /// Questioning stops after `skip_limit` non-answers. Returns the number
    /// of answers folded into the ground truth.
    pub fn ask_questions(&mut self, tracker: &ExemplarsTracker) -> EvoResult<usize> {
        let budget = self.config.questions_per_generation;
        let skip_limit = self.config.skip_limit;
        let oracle = match self.oracle.as_mut() {
            Some(oracle) => oracle,
            None => return Ok(0),
        };
        let properties = self.engine.properties();

        let mut answered = 0;
        let mut skipped = 0;
        for exemplar in tracker.exemplars() {
            if answered >= budget {
                break;
            }
            let pair = exemplar.pair;
            if self.store.is_resolved(pair.id1(), pair.id2()) {
                continue;
            }

            let (r1, r2) = match (
                self.engine.find_record_by_id(pair.id1()),
                self.engine.find_record_by_id(pair.id2()),
            ) {
                (Some(r1), Some(r2)) => (r1, r2),
                _ => {
                    tracing::warn!(pair = %pair, "proposed pair refers to an unknown record");
                    continue;
                }
            };
            let prompt = pretty_compare(
                r1,
                r2,
                exemplar.count as f64,
                QUESTION_CAPTION,
                &properties,
            );
            let question = Question {
                pair: pair.clone(),
                prompt,
            };

            let Some(decision) = oracle.decision(&question)? else {
                skipped += 1;
                if skipped >= skip_limit {
                    tracing::warn!(skipped, answered, "too many unanswered questions, moving on");
                    break;
                }
                tracing::debug!(pair = %pair, "no answer, skipping pair");
                continue;
            };
            self.store.assert_decision(
                pair.id1(),
                pair.id2(),
                decision,
                Provenance::AssertedByOracle,
            )?;
            tracing::info!(
                pair = %pair,
                decision = decision.symbol(),
                count = exemplar.count,
                score = exemplar.score,
                "oracle answered"
            );
            self.asked_pairs.push(pair);
            answered += 1;
        }
        Ok(answered)
    }

    fn result(&self) -> EvoResult<TuningResult> {
        let best = self.reported_genotype().ok_or(EvolutionError::EmptyPopulation)?;
        Ok(TuningResult {
            best_configuration: best.parameters().clone(),
            best_fitness: best.fitness().unwrap_or(0.0),
            best_ever_fitness: self.best_ever,
            generations: self.stats.num_generations(),
            active_learning: self.active,
            asked_pairs: self.asked_pairs.clone(),
            stats: self.stats.clone(),
        })
    }
}

impl<E, O> GeneticAlgorithm<E, O> {
    /// Parameters of the best configuration seen so far
    ///
    /// With a fixed ground truth this is the genotype that reached the
    /// best-ever fitness. Under active learning earlier fitness values were
    /// scored against less ground truth, so the top genotype of the last
    /// evaluated generation is returned instead.
    pub fn best_configuration(&self) -> Option<&ParameterMap> {
        self.reported_genotype().map(|g| g.parameters())
    }

    fn reported_genotype(&self) -> Option<&Genotype> {
        if self.active {
            self.top_genotype.as_ref()
        } else {
            self.best_genotype.as_ref()
        }
    }

    /// Best fitness seen in any generation
    pub fn best_ever_fitness(&self) -> f64 {
        self.best_ever
    }

    /// Current population
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Ground truth, including oracle answers
    pub fn ground_truth(&self) -> &GroundTruthStore {
        &self.store
    }

    /// The oracle, if one was given
    pub fn oracle(&self) -> Option<&O> {
        self.oracle.as_ref()
    }

    /// The matching engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run parameters
    pub fn config(&self) -> &GeneticConfig {
        &self.config
    }

    /// Check if oracle questions are asked
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Pairs the oracle answered, in order
    pub fn asked_pairs(&self) -> &[RecordPair] {
        &self.asked_pairs
    }

    /// Statistics of the generations run so far
    pub fn stats(&self) -> &EvolutionStats {
        &self.stats
    }
}

impl<E, O> std::fmt::Debug for GeneticAlgorithm<E, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneticAlgorithm")
            .field("config", &self.config)
            .field("active", &self.active)
            .field("generation", &self.population.generation())
            .field("best_ever", &self.best_ever)
            .finish()
    }
}
