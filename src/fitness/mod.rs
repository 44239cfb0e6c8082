//! Fitness evaluation
//!
//! This module scores a configuration's proposed links against ground truth.

pub mod evaluator;

pub mod prelude {
    pub use super::evaluator::*;
}
