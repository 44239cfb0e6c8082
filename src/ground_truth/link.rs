//! Record pairs and the facts known about them

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unordered pair of record identifiers
///
/// Stored with `id1 <= id2`, so `(a, b)` and `(b, a)` are the same pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordPair {
    id1: String,
    id2: String,
}

impl RecordPair {
    /// Create a normalised pair
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { id1: a, id2: b }
        } else {
            Self { id1: b, id2: a }
        }
    }

    /// The lexicographically smaller identifier
    pub fn id1(&self) -> &str {
        &self.id1
    }

    /// The lexicographically larger identifier
    pub fn id2(&self) -> &str {
        &self.id2
    }

    /// Check if both sides are the same record
    pub fn is_reflexive(&self) -> bool {
        self.id1 == self.id2
    }
}

impl fmt::Display for RecordPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.id1, self.id2)
    }
}

/// Whether two records refer to the same entity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// Same entity
    Match,
    /// Different entities
    NonMatch,
    /// The oracle could not tell
    Uncertain,
}

impl Decision {
    /// Label used in test files
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Match => "+",
            Self::NonMatch => "-",
            Self::Uncertain => "?",
        }
    }

    /// Parse a test-file label
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Self::Match),
            "-" => Some(Self::NonMatch),
            "?" => Some(Self::Uncertain),
            _ => None,
        }
    }
}

/// Where a fact came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provenance {
    /// Answered by the oracle during this run
    AssertedByOracle,
    /// Loaded from a test file at startup
    AssertedFromFile,
    /// Derived from other facts
    Inferred,
}

impl Provenance {
    /// Check if this is a direct assertion rather than an inference
    pub fn is_asserted(&self) -> bool {
        !matches!(self, Self::Inferred)
    }
}

/// A ground-truth fact about one pair
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// The pair the fact is about
    pub pair: RecordPair,
    /// What is known about the pair
    pub decision: Decision,
    /// Where the fact came from
    pub provenance: Provenance,
}

impl Link {
    /// Create a new fact
    pub fn new(pair: RecordPair, decision: Decision, provenance: Provenance) -> Self {
        Self {
            pair,
            decision,
            provenance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_is_unordered() {
        let a = RecordPair::new("r2", "r1");
        let b = RecordPair::new("r1", "r2");
        assert_eq!(a, b);
        assert_eq!(a.id1(), "r1");
        assert_eq!(a.id2(), "r2");
        assert_eq!(a.to_string(), "(r1, r2)");
    }

    #[test]
    fn test_decision_symbols() {
        for decision in [Decision::Match, Decision::NonMatch, Decision::Uncertain] {
            assert_eq!(Decision::from_symbol(decision.symbol()), Some(decision));
        }
        assert_eq!(Decision::from_symbol("x"), None);
    }

    #[test]
    fn test_provenance_is_asserted() {
        assert!(Provenance::AssertedByOracle.is_asserted());
        assert!(Provenance::AssertedFromFile.is_asserted());
        assert!(!Provenance::Inferred.is_asserted());
    }
}
