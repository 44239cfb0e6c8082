//! Error types for linkage-evo
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Error type for ground-truth loading and persistence
#[derive(Debug, Error)]
pub enum GroundTruthError {
    /// IO error while reading or writing a test file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV-level error in a test file
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A line that is not a valid labeled pair
    #[error("Malformed test file line {line}: {reason}")]
    Malformed { line: u64, reason: String },

    /// A pair linking a record to itself
    #[error("Record {0} cannot be linked to itself")]
    SelfLink(String),
}

/// Error type for the matching collaborator
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchingError {
    /// The parameter mapping could not be turned into an engine configuration
    #[error("Cannot materialize configuration: {0}")]
    Materialize(String),

    /// Linking was attempted before the record set was committed
    #[error("Record set has not been committed")]
    NotCommitted,

    /// Records were indexed after the record set was committed
    #[error("Record set is read-only once committed")]
    AlreadyCommitted,

    /// Any other engine failure
    #[error("Matching engine failure: {0}")]
    Engine(String),
}

/// Error type for oracle interaction
#[derive(Debug, Error)]
pub enum OracleError {
    /// IO error on the oracle's console
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The oracle worker is gone
    #[error("Oracle disconnected")]
    Disconnected,
}

/// Top-level error type for evolution operations
#[derive(Debug, Error)]
pub enum EvolutionError {
    /// Ground truth could not be loaded
    #[error("Ground truth error: {0}")]
    GroundTruth(#[from] GroundTruthError),

    /// Matching collaborator error
    #[error("Matching error: {0}")]
    Matching(#[from] MatchingError),

    /// Oracle error
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A new generation did not have the population's size
    #[error("Population size mismatch: expected {expected}, got {actual}")]
    PopulationSize { expected: usize, actual: usize },

    /// Empty population
    #[error("Empty population")]
    EmptyPopulation,

    /// Serialization of results failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for evolution operations
pub type EvoResult<T> = Result<T, EvolutionError>;
