//! In-memory ground truth with inference
//!
//! The store holds directly asserted facts, at most one per pair. Lookups fall
//! back to inference when enabled:
//!
//! - Match facts are transitive: records joined by a chain of Match facts form
//!   one equivalence class, and any two members of a class match.
//! - A NonMatch fact between two members of different classes makes every
//!   member of one class a non-match of every member of the other.
//!
//! An inferred fact never overrides a direct assertion.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::GroundTruthError;
use crate::ground_truth::link::{Decision, Link, Provenance, RecordPair};

/// Store of known (pair → decision) facts
///
/// Match classes are kept up to date as facts are asserted. Replacing a
/// Match or NonMatch fact with a different decision rebuilds them.
#[derive(Clone, Debug)]
pub struct GroundTruthStore {
    asserted: HashMap<RecordPair, Link>,
    do_inference: bool,
    /// Record id → representative id of its Match class
    classes: HashMap<String, String>,
    /// Representative id → members of its Match class
    members: HashMap<String, Vec<String>>,
    /// Representative id → representatives of classes known not to match it
    non_matching: HashMap<String, HashSet<String>>,
}

impl GroundTruthStore {
    /// Create an empty store with inference enabled
    pub fn new() -> Self {
        Self {
            asserted: HashMap::new(),
            do_inference: true,
            classes: HashMap::new(),
            members: HashMap::new(),
            non_matching: HashMap::new(),
        }
    }

    /// Enable or disable inference on lookup
    pub fn set_do_inference(&mut self, enabled: bool) {
        self.do_inference = enabled;
    }

    /// Check if inference is enabled
    pub fn does_inference(&self) -> bool {
        self.do_inference
    }

    /// Number of directly asserted facts
    pub fn len(&self) -> usize {
        self.asserted.len()
    }

    /// Check if nothing has been asserted
    pub fn is_empty(&self) -> bool {
        self.asserted.is_empty()
    }

    /// Assert a fact, replacing any earlier assertion for the same pair
    ///
    /// Inferred facts cannot be asserted; they are stored as asserted from
    /// file. Returns the replaced fact, if any.
    pub fn assert_link(&mut self, mut link: Link) -> Result<Option<Link>, GroundTruthError> {
        if link.pair.is_reflexive() {
            return Err(GroundTruthError::SelfLink(link.pair.id1().to_string()));
        }
        if !link.provenance.is_asserted() {
            link.provenance = Provenance::AssertedFromFile;
        }
        let pair = link.pair.clone();
        let decision = link.decision;
        let previous = self.asserted.insert(pair.clone(), link);
        match previous.as_ref().map(|l| l.decision) {
            Some(old) if old == decision => {}
            Some(Decision::Match) | Some(Decision::NonMatch) => self.rebuild_classes(),
            _ => self.apply(&pair, decision),
        }
        Ok(previous)
    }

    /// Convenience for asserting a decision on two ids
    pub fn assert_decision(
        &mut self,
        id1: &str,
        id2: &str,
        decision: Decision,
        provenance: Provenance,
    ) -> Result<Option<Link>, GroundTruthError> {
        self.assert_link(Link::new(RecordPair::new(id1, id2), decision, provenance))
    }

    /// The directly asserted fact for a pair, without inference
    pub fn asserted_link(&self, pair: &RecordPair) -> Option<&Link> {
        self.asserted.get(pair)
    }

    /// Look up what is known about a pair, inferring if necessary
    pub fn infer_link(&self, id1: &str, id2: &str) -> Option<Link> {
        let pair = RecordPair::new(id1, id2);
        if let Some(link) = self.asserted.get(&pair) {
            return Some(link.clone());
        }
        if !self.do_inference {
            return None;
        }

        let rep1 = self.representative(pair.id1());
        let rep2 = self.representative(pair.id2());
        let decision = if rep1 == rep2 {
            Decision::Match
        } else if self
            .non_matching
            .get(rep1)
            .is_some_and(|others| others.contains(rep2))
        {
            Decision::NonMatch
        } else {
            return None;
        };
        Some(Link::new(pair, decision, Provenance::Inferred))
    }

    /// Check if anything is known about a pair
    pub fn is_resolved(&self, id1: &str, id2: &str) -> bool {
        self.infer_link(id1, id2).is_some()
    }

    /// Number of directly asserted Match facts
    pub fn count_matches(&self) -> usize {
        self.asserted
            .values()
            .filter(|l| l.decision == Decision::Match)
            .count()
    }

    /// Number of matching pairs known, counting inferred ones
    ///
    /// Without inference this is the number of asserted Match facts.
    pub fn expected_matches(&self) -> usize {
        if !self.do_inference {
            return self.count_matches();
        }
        self.members
            .values()
            .map(|m| m.len() * (m.len() - 1) / 2)
            .sum()
    }

    /// Directly asserted facts, ordered by pair
    pub fn links(&self) -> Vec<&Link> {
        let ordered: BTreeMap<&RecordPair, &Link> = self.asserted.iter().collect();
        ordered.into_values().collect()
    }

    fn representative<'a>(&'a self, id: &'a str) -> &'a str {
        self.classes.get(id).map_or(id, |r| r.as_str())
    }

    fn apply(&mut self, pair: &RecordPair, decision: Decision) {
        match decision {
            Decision::Match => self.union(pair.id1(), pair.id2()),
            Decision::NonMatch => {
                let rep1 = self.representative(pair.id1()).to_string();
                let rep2 = self.representative(pair.id2()).to_string();
                if rep1 != rep2 {
                    self.non_matching
                        .entry(rep1.clone())
                        .or_default()
                        .insert(rep2.clone());
                    self.non_matching.entry(rep2).or_default().insert(rep1);
                }
            }
            Decision::Uncertain => {}
        }
    }

    fn union(&mut self, id1: &str, id2: &str) {
        let rep1 = self.representative(id1).to_string();
        let rep2 = self.representative(id2).to_string();
        if rep1 == rep2 {
            return;
        }
        for rep in [&rep1, &rep2] {
            if !self.members.contains_key(rep) {
                self.members.insert(rep.clone(), vec![rep.clone()]);
                self.classes.insert(rep.clone(), rep.clone());
            }
        }

        // the smaller class is relabelled
        let (keep, merge) = if self.members[&rep1].len() >= self.members[&rep2].len() {
            (rep1, rep2)
        } else {
            (rep2, rep1)
        };
        let moved = self.members.remove(&merge).unwrap_or_default();
        for id in &moved {
            self.classes.insert(id.clone(), keep.clone());
        }
        self.members.entry(keep.clone()).or_default().extend(moved);

        if let Some(others) = self.non_matching.remove(&merge) {
            for other in others {
                if let Some(back) = self.non_matching.get_mut(&other) {
                    back.remove(&merge);
                }
                if other != keep {
                    self.non_matching
                        .entry(other.clone())
                        .or_default()
                        .insert(keep.clone());
                    self.non_matching.entry(keep.clone()).or_default().insert(other);
                }
            }
        }
        if let Some(own) = self.non_matching.get_mut(&keep) {
            own.remove(&keep);
        }
    }

    fn rebuild_classes(&mut self) {
        self.classes.clear();
        self.members.clear();
        self.non_matching.clear();

        let facts: Vec<(RecordPair, Decision)> = self
            .asserted
            .values()
            .map(|l| (l.pair.clone(), l.decision))
            .collect();
        for (pair, decision) in &facts {
            self.apply(pair, *decision);
        }
    }
}

impl Default for GroundTruthStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(facts: &[(&str, &str, Decision)]) -> GroundTruthStore {
        let mut store = GroundTruthStore::new();
        for (a, b, d) in facts {
            store
                .assert_decision(a, b, *d, Provenance::AssertedFromFile)
                .unwrap();
        }
        store
    }

    #[test]
    fn test_direct_lookup_is_symmetric() {
        let store = store_with(&[("a", "b", Decision::Match)]);
        let link = store.infer_link("b", "a").unwrap();
        assert_eq!(link.decision, Decision::Match);
        assert_eq!(link.provenance, Provenance::AssertedFromFile);
    }

    #[test]
    fn test_unknown_pair() {
        let store = store_with(&[("a", "b", Decision::Match)]);
        assert!(store.infer_link("a", "c").is_none());
        assert!(!store.is_resolved("c", "d"));
    }

    #[test]
    fn test_match_is_transitive() {
        let store = store_with(&[("a", "b", Decision::Match), ("c", "b", Decision::Match)]);
        let link = store.infer_link("a", "c").unwrap();
        assert_eq!(link.decision, Decision::Match);
        assert_eq!(link.provenance, Provenance::Inferred);
    }

    #[test]
    fn test_non_match_spreads_across_classes() {
        let store = store_with(&[
            ("a", "b", Decision::Match),
            ("c", "d", Decision::Match),
            ("b", "d", Decision::NonMatch),
        ]);
        let link = store.infer_link("a", "c").unwrap();
        assert_eq!(link.decision, Decision::NonMatch);
        assert_eq!(link.provenance, Provenance::Inferred);
    }

    #[test]
    fn test_expected_matches_counts_classes() {
        let mut store = store_with(&[
            ("a", "b", Decision::Match),
            ("b", "c", Decision::Match),
            ("d", "e", Decision::Match),
            ("a", "d", Decision::NonMatch),
        ]);
        assert_eq!(store.count_matches(), 3);
        // {a, b, c} gives 3 pairs, {d, e} gives 1
        assert_eq!(store.expected_matches(), 4);

        store.set_do_inference(false);
        assert_eq!(store.expected_matches(), 3);
    }

    #[test]
    fn test_non_match_is_not_transitive() {
        let store = store_with(&[("a", "b", Decision::NonMatch), ("b", "c", Decision::NonMatch)]);
        assert!(store.infer_link("a", "c").is_none());
    }

    #[test]
    fn test_uncertain_resolves_but_does_not_infer() {
        let store = store_with(&[("a", "b", Decision::Uncertain), ("b", "c", Decision::Match)]);
        assert!(store.is_resolved("a", "b"));
        assert!(store.infer_link("a", "c").is_none());
    }

    #[test]
    fn test_inference_never_overrides_assertion() {
        let store = store_with(&[
            ("a", "b", Decision::Match),
            ("b", "c", Decision::Match),
            ("a", "c", Decision::NonMatch),
        ]);
        let link = store.infer_link("c", "a").unwrap();
        assert_eq!(link.decision, Decision::NonMatch);
        assert!(link.provenance.is_asserted());
    }

    #[test]
    fn test_inference_can_be_disabled() {
        let mut store = store_with(&[("a", "b", Decision::Match), ("b", "c", Decision::Match)]);
        store.set_do_inference(false);
        assert!(store.infer_link("a", "c").is_none());
        assert!(store.infer_link("a", "b").is_some());
    }

    #[test]
    fn test_reassert_replaces() {
        let mut store = store_with(&[("a", "b", Decision::Uncertain)]);
        let previous = store
            .assert_decision("b", "a", Decision::Match, Provenance::AssertedByOracle)
            .unwrap();
        assert_eq!(previous.unwrap().decision, Decision::Uncertain);
        assert_eq!(store.len(), 1);
        assert_eq!(store.count_matches(), 1);
    }

    #[test]
    fn test_replacing_a_match_splits_the_class() {
        let mut store = store_with(&[
            ("a", "b", Decision::Match),
            ("b", "c", Decision::Match),
            ("c", "d", Decision::NonMatch),
        ]);
        assert_eq!(store.infer_link("a", "d").unwrap().decision, Decision::NonMatch);

        store
            .assert_decision("b", "c", Decision::NonMatch, Provenance::AssertedByOracle)
            .unwrap();
        // {a, b} no longer reaches c, but now does not match it
        assert_eq!(store.infer_link("a", "c").unwrap().decision, Decision::NonMatch);
        assert!(store.infer_link("a", "d").is_none());
        assert_eq!(store.expected_matches(), 1);
    }

    #[test]
    fn test_non_match_follows_later_merges() {
        let store = store_with(&[
            ("a", "x", Decision::NonMatch),
            ("a", "b", Decision::Match),
            ("x", "y", Decision::Match),
            ("y", "z", Decision::Match),
        ]);
        assert_eq!(store.infer_link("b", "z").unwrap().decision, Decision::NonMatch);
        assert_eq!(store.infer_link("z", "x").unwrap().decision, Decision::Match);
    }

    #[test]
    fn test_large_chain_loads_quickly() {
        let mut store = GroundTruthStore::new();
        let n = 20_000;
        let start = std::time::Instant::now();
        for i in 0..n {
            store
                .assert_decision(
                    &format!("r{}", i),
                    &format!("r{}", i + 1),
                    Decision::Match,
                    Provenance::AssertedFromFile,
                )
                .unwrap();
        }
        for i in 0..n {
            store
                .assert_decision(
                    &format!("r{}", i),
                    &format!("s{}", i),
                    Decision::NonMatch,
                    Provenance::AssertedFromFile,
                )
                .unwrap();
        }
        assert!(start.elapsed() < std::time::Duration::from_secs(20));

        assert_eq!(store.len(), 2 * n);
        assert_eq!(store.expected_matches(), (n + 1) * n / 2);
        assert_eq!(
            store.infer_link("r0", &format!("r{}", n)).unwrap().decision,
            Decision::Match
        );
        assert_eq!(
            store.infer_link(&format!("r{}", n), "s0").unwrap().decision,
            Decision::NonMatch
        );
    }

    #[test]
    fn test_self_link_rejected() {
        let mut store = GroundTruthStore::new();
        let err = store
            .assert_decision("a", "a", Decision::Match, Provenance::AssertedByOracle)
            .unwrap_err();
        assert!(matches!(err, GroundTruthError::SelfLink(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_inferred_provenance_is_stored_as_assertion() {
        let mut store = GroundTruthStore::new();
        store
            .assert_link(Link::new(
                RecordPair::new("a", "b"),
                Decision::Match,
                Provenance::Inferred,
            ))
            .unwrap();
        let link = store.asserted_link(&RecordPair::new("a", "b")).unwrap();
        assert!(link.provenance.is_asserted());
    }

    #[test]
    fn test_links_are_ordered() {
        let store = store_with(&[
            ("c", "d", Decision::NonMatch),
            ("a", "b", Decision::Match),
        ]);
        let pairs: Vec<String> = store.links().iter().map(|l| l.pair.to_string()).collect();
        assert_eq!(pairs, vec!["(a, b)", "(c, d)"]);
    }
}
