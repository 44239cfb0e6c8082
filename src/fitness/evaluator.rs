//! F-measure of proposed links against ground truth

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ground_truth::link::{Decision, RecordPair};
use crate::ground_truth::store::GroundTruthStore;
use crate::matching::ProposedLink;

/// How proposed matches with no known fact are scored
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringMode {
    /// Unknown pairs count as wrong
    Pessimistic,
    /// Unknown pairs are left out of the score
    ///
    /// Required for active learning, where ground truth starts almost empty.
    Optimistic,
}

impl Default for ScoringMode {
    fn default() -> Self {
        Self::Pessimistic
    }
}

/// Counts and scores of one evaluation
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FMeasure {
    /// Proposed matches known to match
    pub correct: usize,
    /// Proposed matches known not to match (plus unknowns when pessimistic)
    pub wrong: usize,
    /// Proposed matches with no known fact
    pub unknown: usize,
    /// Proposed matches whose known fact is Uncertain
    pub uncertain: usize,
    /// Directly asserted Match facts in the ground truth
    pub expected: usize,
    /// correct / (correct + wrong)
    pub precision: f64,
    /// correct / expected
    pub recall: f64,
    /// Harmonic mean of precision and recall
    pub f_measure: f64,
}

/// Scores proposed links against a ground-truth store
#[derive(Clone, Copy, Debug, Default)]
pub struct LinkEvaluator {
    mode: ScoringMode,
}

impl LinkEvaluator {
    /// Create an evaluator with the given scoring mode
    pub fn new(mode: ScoringMode) -> Self {
        Self { mode }
    }

    /// The scoring mode
    pub fn mode(&self) -> ScoringMode {
        self.mode
    }

    /// Score the proposed matches among `links`
    ///
    /// Possible matches are ignored, as are repeated and reflexive pairs.
    pub fn evaluate(&self, links: &[ProposedLink], store: &GroundTruthStore) -> FMeasure {
        let mut result = FMeasure {
            expected: store.count_matches(),
            ..FMeasure::default()
        };

        let mut seen = HashSet::new();
        for link in links.iter().filter(|l| l.is_match()) {
            let pair = RecordPair::new(link.id1.as_str(), link.id2.as_str());
            if pair.is_reflexive() || !seen.insert(pair) {
                continue;
            }
            match store.infer_link(&link.id1, &link.id2).map(|l| l.decision) {
                Some(Decision::Match) => result.correct += 1,
                Some(Decision::NonMatch) => result.wrong += 1,
                Some(Decision::Uncertain) => result.uncertain += 1,
                None => {
                    result.unknown += 1;
                    if self.mode == ScoringMode::Pessimistic {
                        result.wrong += 1;
                    }
                }
            }
        }

        let judged = result.correct + result.wrong;
        result.precision = if judged > 0 {
            result.correct as f64 / judged as f64
        } else {
            0.0
        };
        result.recall = if result.expected > 0 {
            (result.correct as f64 / result.expected as f64).min(1.0)
        } else {
            0.0
        };
        result.f_measure = if result.precision + result.recall > 0.0 {
            2.0 * result.precision * result.recall / (result.precision + result.recall)
        } else {
            0.0
        };
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ground_truth::link::Provenance;
    use crate::matching::LinkKind;

    fn store() -> GroundTruthStore {
        let mut store = GroundTruthStore::new();
        for (a, b, d) in [
            ("1", "2", Decision::Match),
            ("3", "4", Decision::Match),
            ("1", "3", Decision::NonMatch),
            ("2", "4", Decision::Uncertain),
        ] {
            store
                .assert_decision(a, b, d, Provenance::AssertedFromFile)
                .unwrap();
        }
        store
    }

    fn matched(a: &str, b: &str) -> ProposedLink {
        ProposedLink::new(a, b, LinkKind::Match, 0.9)
    }

    #[test]
    fn test_perfect_score() {
        let links = vec![matched("1", "2"), matched("4", "3")];
        let f = LinkEvaluator::new(ScoringMode::Pessimistic).evaluate(&links, &store());
        assert_eq!(f.correct, 2);
        assert_eq!(f.precision, 1.0);
        assert_eq!(f.recall, 1.0);
        assert_eq!(f.f_measure, 1.0);
    }

    #[test]
    fn test_pessimistic_counts_unknown_as_wrong() {
        let links = vec![matched("1", "2"), matched("5", "6")];
        let f = LinkEvaluator::new(ScoringMode::Pessimistic).evaluate(&links, &store());
        assert_eq!(f.unknown, 1);
        assert_eq!(f.wrong, 1);
        assert_eq!(f.precision, 0.5);
        assert_eq!(f.recall, 0.5);
        assert!((f.f_measure - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_optimistic_ignores_unknown() {
        let links = vec![matched("1", "2"), matched("5", "6")];
        let f = LinkEvaluator::new(ScoringMode::Optimistic).evaluate(&links, &store());
        assert_eq!(f.unknown, 1);
        assert_eq!(f.wrong, 0);
        assert_eq!(f.precision, 1.0);
        assert!((f.f_measure - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_uncertain_is_neither_right_nor_wrong() {
        let links = vec![matched("1", "2"), matched("2", "4")];
        let f = LinkEvaluator::new(ScoringMode::Pessimistic).evaluate(&links, &store());
        assert_eq!(f.uncertain, 1);
        assert_eq!(f.wrong, 0);
        assert_eq!(f.precision, 1.0);
    }

    #[test]
    fn test_maybe_matches_and_duplicates_ignored() {
        let links = vec![
            matched("1", "2"),
            matched("2", "1"),
            ProposedLink::new("1", "3", LinkKind::MaybeMatch, 0.4),
        ];
        let f = LinkEvaluator::new(ScoringMode::Pessimistic).evaluate(&links, &store());
        assert_eq!(f.correct, 1);
        assert_eq!(f.wrong, 0);
    }

    #[test]
    fn test_recall_counts_only_asserted_matches() {
        let mut store = GroundTruthStore::new();
        for (a, b) in [("a", "b"), ("b", "c")] {
            store
                .assert_decision(a, b, Decision::Match, Provenance::AssertedFromFile)
                .unwrap();
        }
        assert_eq!(store.expected_matches(), 3);

        // (a, c) is only inferred, but still correct
        let f = LinkEvaluator::new(ScoringMode::Pessimistic).evaluate(&[matched("a", "c")], &store);
        assert_eq!(f.correct, 1);
        assert_eq!(f.expected, 2);
        assert_eq!(f.recall, 0.5);

        let all = vec![matched("a", "b"), matched("b", "c"), matched("a", "c")];
        let f = LinkEvaluator::new(ScoringMode::Pessimistic).evaluate(&all, &store);
        assert_eq!(f.correct, 3);
        assert_eq!(f.recall, 1.0);
    }

    #[test]
    fn test_empty_ground_truth_scores_zero() {
        let links = vec![matched("1", "2")];
        let f = LinkEvaluator::new(ScoringMode::Optimistic)
            .evaluate(&links, &GroundTruthStore::new());
        assert_eq!(f.f_measure, 0.0);
        assert_eq!(f.unknown, 1);
    }
}
