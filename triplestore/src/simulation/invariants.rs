//! Reference model and invariant checks for simulation testing.

// Simulation code legitimately needs cloning for test data
#![allow(clippy::disallowed_methods)]

use std::collections::BTreeSet;

use crate::index::{IndexKind, select_index};
use crate::store::Store;
use crate::types::{Pattern, Triple};

/// The set of triples the store should hold.
#[derive(Debug, Default, Clone)]
pub struct Model {
    triples: BTreeSet<Triple>,
}

impl Model {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, triple: Triple) {
        self.triples.insert(triple);
    }

    pub fn remove(&mut self, triple: &Triple) {
        self.triples.remove(triple);
    }

    #[must_use]
    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Triples matching `pattern`, in the key order of the index a query
    /// for `pattern` scans.
    #[must_use]
    pub fn query(&self, pattern: &Pattern<'_>) -> Vec<Triple> {
        let index = select_index(pattern);
        let mut matches: Vec<(Vec<u8>, Triple)> = self
            .triples
            .iter()
            .filter(|triple| pattern.matches(triple))
            .map(|triple| {
                let key = index.encode(&triple.subject, &triple.predicate, &triple.object);
                (key, triple.clone())
            })
            .collect();
        matches.sort();
        matches.into_iter().map(|(_, triple)| triple).collect()
    }
}

/// An invariant violation detected during simulation.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violation.
    pub description: String,
    /// Operation index where it was detected.
    pub operation_index: usize,
    /// Additional context.
    pub context: String,
}

/// Checker comparing store answers with the model.
#[derive(Debug, Default)]
pub struct InvariantChecker {
    violations: Vec<InvariantViolation>,
}

impl InvariantChecker {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    #[must_use]
    pub fn violations(&self) -> &[InvariantViolation] {
        &self.violations
    }

    #[must_use]
    pub const fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    pub fn add_violation(&mut self, violation: InvariantViolation) {
        self.violations.push(violation);
    }

    fn violation(&mut self, operation_index: usize, description: &str, context: String) {
        self.add_violation(InvariantViolation {
            description: description.to_string(),
            operation_index,
            context,
        });
    }

    /// Check a point lookup answer.
    pub fn check_contains(
        &mut self,
        answer: bool,
        model: &Model,
        triple: &Triple,
        operation_index: usize,
    ) {
        let expected = model.contains(triple);
        if answer != expected {
            self.violation(
                operation_index,
                "contains disagrees with model",
                format!("{triple:?}: store={answer} model={expected}"),
            );
        }
    }

    /// Check query results, including their order.
    pub fn check_query(
        &mut self,
        results: &[Triple],
        model: &Model,
        pattern: &Pattern<'_>,
        operation_index: usize,
    ) {
        let expected = model.query(pattern);
        if results != expected.as_slice() {
            self.violation(
                operation_index,
                "query results disagree with model",
                format!(
                    "pattern {pattern}: store returned {} triples, model expects {}",
                    results.len(),
                    expected.len()
                ),
            );
        }
    }

    /// Check that the size estimate matches the model.
    pub fn check_size(&mut self, size: u64, model: &Model, operation_index: usize) {
        if size != model.len() as u64 {
            self.violation(
                operation_index,
                "size disagrees with model",
                format!("store={size} model={}", model.len()),
            );
        }
    }

    /// Check that every modelled triple is present in all three indexes.
    pub fn check_indexes_agree(&mut self, store: &Store, model: &Model, operation_index: usize) {
        for triple in model.iter() {
            for index in IndexKind::ALL {
                if !store.index_contains(index, triple) {
                    self.violation(
                        operation_index,
                        "triple missing from index",
                        format!("{triple:?} not in {index}"),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_query_orders_by_chosen_index() {
        let mut model = Model::new();
        model.add(Triple::new("s2", "p", "o1"));
        model.add(Triple::new("s1", "p", "o2"));
        model.add(Triple::new("s1", "q", "o1"));

        // Object bound: OSP order, so subjects ascend within the object
        let results = model.query(&Pattern::any().with_object(b"o1"));
        assert_eq!(
            results,
            vec![Triple::new("s1", "q", "o1"), Triple::new("s2", "p", "o1")]
        );
    }

    #[test]
    fn test_checker_records_violations() {
        let mut model = Model::new();
        model.add(Triple::new("s", "p", "o"));
        let mut checker = InvariantChecker::new();

        checker.check_contains(true, &model, &Triple::new("s", "p", "o"), 0);
        checker.check_size(1, &model, 1);
        assert!(!checker.has_violations());

        checker.check_contains(false, &model, &Triple::new("s", "p", "o"), 2);
        checker.check_query(&[], &model, &Pattern::any(), 3);
        assert_eq!(checker.violations().len(), 2);
        assert_eq!(checker.violations()[1].operation_index, 3);
    }
}
