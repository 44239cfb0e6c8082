//! Evolutionary algorithms
//!
//! This module provides the tuning genetic algorithm and its reproduction
//! policy.

pub mod genetic;
pub mod reproduction;

pub mod prelude {
    pub use super::genetic::*;
    pub use super::reproduction::*;
}
