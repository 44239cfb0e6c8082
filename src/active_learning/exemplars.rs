//! Tracking which pairs the population proposes
//!
//! During one generation's evaluation the tracker counts, for every pair, how
//! many genotypes proposed it as a match. The pairs are then ranked by the
//! generation's [`Scorer`].

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::active_learning::scorer::Scorer;
use crate::ground_truth::link::RecordPair;
use crate::matching::ProposedLink;

/// A pair worth asking the oracle about
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exemplar {
    /// The pair
    pub pair: RecordPair,
    /// Genotypes that proposed the pair as a match
    pub count: usize,
    /// Informativeness under the generation's scorer
    pub score: usize,
}

/// Per-generation agreement counts over proposed pairs
pub struct ExemplarsTracker {
    scorer: Box<dyn Scorer>,
    counts: HashMap<RecordPair, usize>,
}

impl ExemplarsTracker {
    /// Create an empty tracker using the given scorer
    pub fn new(scorer: Box<dyn Scorer>) -> Self {
        Self {
            scorer,
            counts: HashMap::new(),
        }
    }

    /// Count one genotype's proposed pairs
    ///
    /// A pair proposed several times by the same genotype counts once.
    pub fn track<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = RecordPair>,
    {
        let unique: HashSet<RecordPair> = pairs
            .into_iter()
            .filter(|p| !p.is_reflexive())
            .collect();
        for pair in unique {
            *self.counts.entry(pair).or_insert(0) += 1;
        }
    }

    /// Count one genotype's proposed matches, ignoring possible matches
    pub fn track_links(&mut self, links: &[ProposedLink]) {
        self.track(
            links
                .iter()
                .filter(|l| l.is_match())
                .map(|l| RecordPair::new(l.id1.as_str(), l.id2.as_str())),
        );
    }

    /// Add another tracker's counts to this one
    pub fn merge(&mut self, other: ExemplarsTracker) {
        for (pair, count) in other.counts {
            *self.counts.entry(pair).or_insert(0) += count;
        }
    }

    /// Number of genotypes that proposed a pair
    pub fn count(&self, pair: &RecordPair) -> usize {
        self.counts.get(pair).copied().unwrap_or(0)
    }

    /// Number of distinct pairs seen
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if no pairs were seen
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Pairs by descending score, ties ordered by pair
    pub fn exemplars(&self) -> Vec<Exemplar> {
        let mut exemplars: Vec<Exemplar> = self
            .counts
            .iter()
            .map(|(pair, &count)| Exemplar {
                pair: pair.clone(),
                count,
                score: self.scorer.compute_score(count),
            })
            .collect();
        exemplars.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.pair.cmp(&b.pair)));
        exemplars
    }
}

impl std::fmt::Debug for ExemplarsTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExemplarsTracker")
            .field("pairs", &self.counts.len())
            .finish()
    }
}
