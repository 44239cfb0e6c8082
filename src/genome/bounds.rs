//! Bounds for tunable parameters
//!
//! This module provides the valid range of a single parameter and the
//! named parameter space a genotype lives in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Valid range of a single parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Lower bound (inclusive)
    pub min: f64,
    /// Upper bound (inclusive)
    pub max: f64,
}

impl Bounds {
    /// Create new bounds
    ///
    /// # Panics
    /// Panics if min > max
    pub fn new(min: f64, max: f64) -> Self {
        assert!(
            min <= max,
            "Invalid bounds: min ({}) must be <= max ({})",
            min,
            max
        );
        Self { min, max }
    }

    /// Create unit bounds [0, 1]
    ///
    /// Most matcher thresholds and probabilities live here.
    pub fn unit() -> Self {
        Self::new(0.0, 1.0)
    }

    /// Get the range (max - min)
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Check if a value is within bounds
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp a value to be within bounds
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::unit()
    }
}

impl From<(f64, f64)> for Bounds {
    fn from((min, max): (f64, f64)) -> Self {
        Self::new(min, max)
    }
}

/// The named, bounded parameters under search
///
/// Iteration order is the parameter names' sort order, which keeps random
/// draws reproducible for a seeded generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpace {
    parameters: BTreeMap<String, Bounds>,
}

impl ParameterSpace {
    /// Create an empty parameter space
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter (builder style)
    pub fn with(mut self, name: impl Into<String>, bounds: impl Into<Bounds>) -> Self {
        self.insert(name, bounds);
        self
    }

    /// Add or replace a parameter
    pub fn insert(&mut self, name: impl Into<String>, bounds: impl Into<Bounds>) {
        self.parameters.insert(name.into(), bounds.into());
    }

    /// Get bounds for a parameter
    pub fn get(&self, name: &str) -> Option<&Bounds> {
        self.parameters.get(name)
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Check if there are no parameters
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Iterate over (name, bounds) in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bounds)> {
        self.parameters.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Clamp a value for the named parameter; unknown names pass through
    pub fn clamp(&self, name: &str, value: f64) -> f64 {
        self.get(name).map_or(value, |b| b.clamp(value))
    }
}

impl<S: Into<String>, B: Into<Bounds>> FromIterator<(S, B)> for ParameterSpace {
    fn from_iter<I: IntoIterator<Item = (S, B)>>(iter: I) -> Self {
        Self {
            parameters: iter
                .into_iter()
                .map(|(name, bounds)| (name.into(), bounds.into()))
                .collect(),
        }
    }
}
