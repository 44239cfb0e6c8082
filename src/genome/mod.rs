//! Genome representation
//!
//! This module provides the parameter space and the `Genotype` evolved over it.

pub mod bounds;
pub mod genotype;

pub mod prelude {
    pub use super::bounds::*;
    pub use super::genotype::*;
}
