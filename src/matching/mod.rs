//! Matching collaborator interface
//!
//! The search never compares records itself. It drives a [`MatchingEngine`]
//! that owns the indexed record set and, given a parameter mapping, proposes
//! which record pairs match.

pub mod display;
pub mod memory;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::MatchingError;
use crate::genome::genotype::ParameterMap;

/// A record: an identifier plus multi-valued named fields
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    id: String,
    fields: BTreeMap<String, Vec<String>>,
}

impl Record {
    /// Create a record with no fields
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a value to a field (builder style)
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_value(field, value);
        self
    }

    /// Add a value to a field
    pub fn add_value(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(field.into()).or_default().push(value.into());
    }

    /// The record identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// All values of a field
    pub fn values(&self, field: &str) -> &[String] {
        self.fields.get(field).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Names of the fields this record has
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }
}

/// A source of records to index
pub trait DataSource {
    /// Iterate over the source's records
    fn records(&self) -> Box<dyn Iterator<Item = Record> + '_>;
}

impl DataSource for Vec<Record> {
    fn records(&self) -> Box<dyn Iterator<Item = Record> + '_> {
        Box::new(self.iter().cloned())
    }
}

/// What the engine decided about a pair
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkKind {
    /// Confident match
    Match,
    /// Possible match, below the match threshold
    MaybeMatch,
}

/// One pair the engine proposes under a configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProposedLink {
    /// First record id
    pub id1: String,
    /// Second record id
    pub id2: String,
    /// Engine decision
    pub kind: LinkKind,
    /// Engine confidence in [0, 1]
    pub confidence: f64,
}

impl ProposedLink {
    /// Create a proposed link
    pub fn new(id1: impl Into<String>, id2: impl Into<String>, kind: LinkKind, confidence: f64) -> Self {
        Self {
            id1: id1.into(),
            id2: id2.into(),
            kind,
            confidence,
        }
    }

    /// Check if the engine called this pair a match
    pub fn is_match(&self) -> bool {
        self.kind == LinkKind::Match
    }
}

/// The record-matching engine being tuned
///
/// Records are indexed once and committed; after `commit` the record set is
/// read-only and `link_records` may be called concurrently.
pub trait MatchingEngine: Send + Sync {
    /// Add a record to the index
    fn index(&mut self, record: Record) -> Result<(), MatchingError>;

    /// Freeze the index
    fn commit(&mut self) -> Result<(), MatchingError>;

    /// Look up an indexed record
    fn find_record_by_id(&self, id: &str) -> Option<&Record>;

    /// Link the committed records under the given parameters
    ///
    /// Fails if the parameters cannot be turned into an engine configuration.
    fn link_records(&self, parameters: &ParameterMap) -> Result<Vec<ProposedLink>, MatchingError>;

    /// Field names worth showing when comparing two records
    fn properties(&self) -> Vec<String> {
        Vec::new()
    }

    /// Index every record of every source, then commit
    fn index_all(&mut self, sources: &[&dyn DataSource]) -> Result<usize, MatchingError> {
        let mut count = 0;
        for source in sources {
            for record in source.records() {
                self.index(record)?;
                count += 1;
            }
        }
        self.commit()?;
        Ok(count)
    }
}

pub mod prelude {
    pub use super::display::pretty_compare;
    pub use super::memory::InMemoryEngine;
    pub use super::{DataSource, LinkKind, MatchingEngine, ProposedLink, Record};
}
