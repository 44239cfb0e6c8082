//! A small in-memory matching engine
//!
//! Compares every pair of indexed records field by field. Each compared field
//! has a weight parameter named after it; a pair's confidence is the weighted
//! share of fields with at least one equal value (case-insensitive). Pairs at
//! or above the `threshold` parameter are matches, and pairs at or above the
//! optional `maybe_threshold` parameter are possible matches.

use std::collections::HashMap;

use crate::error::MatchingError;
use crate::genome::bounds::{Bounds, ParameterSpace};
use crate::genome::genotype::ParameterMap;
use crate::matching::{LinkKind, MatchingEngine, ProposedLink, Record};

/// Parameter holding the match threshold
pub const THRESHOLD: &str = "threshold";
/// Parameter holding the possible-match threshold
pub const MAYBE_THRESHOLD: &str = "maybe_threshold";

/// Brute-force reference engine over an in-memory record set
#[derive(Clone, Debug, Default)]
pub struct InMemoryEngine {
    properties: Vec<String>,
    records: Vec<Record>,
    by_id: HashMap<String, usize>,
    committed: bool,
}

impl InMemoryEngine {
    /// Create an engine comparing the given fields
    pub fn new<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            properties: properties.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// The parameter space this engine is tuned over
    ///
    /// One unit-range weight per field, the threshold in [0.5, 1] and the
    /// possible-match threshold in [0, 1].
    pub fn parameter_space(&self) -> ParameterSpace {
        let mut space = ParameterSpace::new()
            .with(THRESHOLD, (0.5, 1.0))
            .with(MAYBE_THRESHOLD, Bounds::unit());
        for property in &self.properties {
            space.insert(property.clone(), Bounds::unit());
        }
        space
    }

    /// Number of indexed records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no records are indexed
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn confidence(&self, r1: &Record, r2: &Record, parameters: &ParameterMap) -> f64 {
        let mut total = 0.0;
        let mut agreeing = 0.0;
        for property in &self.properties {
            let weight = parameters.get(property).copied().unwrap_or(0.0).max(0.0);
            let (v1, v2) = (r1.values(property), r2.values(property));
            if weight == 0.0 || v1.is_empty() || v2.is_empty() {
                continue;
            }
            total += weight;
            let equal = v1.iter().any(|a| {
                v2.iter()
                    .any(|b| a.trim().eq_ignore_ascii_case(b.trim()))
            });
            if equal {
                agreeing += weight;
            }
        }
        if total > 0.0 {
            agreeing / total
        } else {
            0.0
        }
    }
}

impl MatchingEngine for InMemoryEngine {
    fn index(&mut self, record: Record) -> Result<(), MatchingError> {
        if self.committed {
            return Err(MatchingError::AlreadyCommitted);
        }
        match self.by_id.get(record.id()) {
            Some(&i) => self.records[i] = record,
            None => {
                self.by_id.insert(record.id().to_string(), self.records.len());
                self.records.push(record);
            }
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), MatchingError> {
        self.committed = true;
        Ok(())
    }

    fn find_record_by_id(&self, id: &str) -> Option<&Record> {
        self.by_id.get(id).map(|&i| &self.records[i])
    }

    fn link_records(&self, parameters: &ParameterMap) -> Result<Vec<ProposedLink>, MatchingError> {
        if !self.committed {
            return Err(MatchingError::NotCommitted);
        }
        let threshold = *parameters.get(THRESHOLD).ok_or_else(|| {
            MatchingError::Materialize(format!("missing parameter '{}'", THRESHOLD))
        })?;
        if !threshold.is_finite() {
            return Err(MatchingError::Materialize(format!(
                "non-finite threshold {}",
                threshold
            )));
        }
        let maybe_threshold = parameters.get(MAYBE_THRESHOLD).copied();

        let mut links = Vec::new();
        for (i, r1) in self.records.iter().enumerate() {
            for r2 in &self.records[i + 1..] {
                let confidence = self.confidence(r1, r2, parameters);
                let kind = if confidence >= threshold {
                    LinkKind::Match
                } else if maybe_threshold.is_some_and(|t| confidence >= t && confidence > 0.0) {
                    LinkKind::MaybeMatch
                } else {
                    continue;
                };
                links.push(ProposedLink::new(r1.id(), r2.id(), kind, confidence));
            }
        }
        Ok(links)
    }

    fn properties(&self) -> Vec<String> {
        self.properties.clone()
    }
}
