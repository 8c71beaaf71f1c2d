//! Operation generator for deterministic simulation testing.
//!
//! Terms are drawn from small pools so that operations collide often, and
//! pool members share prefixes (`o1`, `o10`, `o11`, ...) so that prefix
//! bounds get exercised.

// Simulation code legitimately needs cloning for test data
#![allow(clippy::disallowed_methods)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::Triple;

/// Configuration for operation generation.
#[derive(Debug, Clone)]
pub struct OpGenConfig {
    /// Number of distinct terms per field.
    pub term_pool_size: usize,
    /// Relative weight of adds.
    pub add_weight: u32,
    /// Relative weight of removes.
    pub remove_weight: u32,
    /// Relative weight of point lookups.
    pub contains_weight: u32,
    /// Relative weight of pattern queries.
    pub query_weight: u32,
    /// Relative weight of closing and reopening the store.
    pub reopen_weight: u32,
    /// Probability that an add carries a term the store must reject.
    pub invalid_term_rate: f64,
}

impl Default for OpGenConfig {
    fn default() -> Self {
        Self {
            term_pool_size: 12,
            add_weight: 40,
            remove_weight: 15,
            contains_weight: 15,
            query_weight: 25,
            reopen_weight: 2,
            invalid_term_rate: 0.0,
        }
    }
}

/// A single simulated operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Add(Triple),
    Remove(Triple),
    Contains(Triple),
    Query {
        subject: Option<Vec<u8>>,
        predicate: Option<Vec<u8>>,
        object: Option<Vec<u8>>,
    },
    Reopen,
}

/// Generator for random, reproducible operations.
pub struct OperationGenerator {
    rng: StdRng,
    config: OpGenConfig,
}

impl OperationGenerator {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, OpGenConfig::default())
    }

    #[must_use]
    pub fn with_config(seed: u64, config: OpGenConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &OpGenConfig {
        &self.config
    }

    /// Generate the next operation.
    pub fn next_operation(&mut self) -> Operation {
        let OpGenConfig {
            add_weight,
            remove_weight,
            contains_weight,
            query_weight,
            reopen_weight,
            ..
        } = self.config;
        let total = add_weight + remove_weight + contains_weight + query_weight + reopen_weight;
        let mut roll = self.rng.random_range(0..total.max(1));

        if roll < add_weight {
            let mut triple = self.random_triple();
            if self.rng.random::<f64>() < self.config.invalid_term_rate {
                self.corrupt(&mut triple);
            }
            return Operation::Add(triple);
        }
        roll -= add_weight;
        if roll < remove_weight {
            return Operation::Remove(self.random_triple());
        }
        roll -= remove_weight;
        if roll < contains_weight {
            return Operation::Contains(self.random_triple());
        }
        roll -= contains_weight;
        if roll < query_weight {
            return Operation::Query {
                subject: self.maybe_term('s'),
                predicate: self.maybe_term('p'),
                object: self.maybe_term('o'),
            };
        }
        Operation::Reopen
    }

    fn random_triple(&mut self) -> Triple {
        Triple::new(self.term('s'), self.term('p'), self.term('o'))
    }

    fn term(&mut self, prefix: char) -> Vec<u8> {
        let n = self.rng.random_range(0..self.config.term_pool_size.max(1));
        format!("u:ex:{prefix}{n}").into_bytes()
    }

    fn maybe_term(&mut self, prefix: char) -> Option<Vec<u8>> {
        self.rng.random_bool(0.5).then(|| self.term(prefix))
    }

    /// Put a separator or out-of-range byte into one of the triple's terms.
    fn corrupt(&mut self, triple: &mut Triple) {
        let bad = if self.rng.random_bool(0.5) { 0x00 } else { 0x7F };
        let term = match self.rng.random_range(0..3) {
            0 => &mut triple.subject,
            1 => &mut triple.predicate,
            _ => &mut triple.object,
        };
        let position = self.rng.random_range(0..=term.len());
        term.insert(position, bad);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_deterministic() {
        let mut gen1 = OperationGenerator::new(42);
        let mut gen2 = OperationGenerator::new(42);

        for _ in 0..100 {
            assert_eq!(gen1.next_operation(), gen2.next_operation());
        }
    }

    #[test]
    fn test_generator_produces_every_kind() {
        let mut generator = OperationGenerator::new(7);
        let ops: Vec<_> = (0..500).map(|_| generator.next_operation()).collect();

        assert!(ops.iter().any(|op| matches!(op, Operation::Add(_))));
        assert!(ops.iter().any(|op| matches!(op, Operation::Remove(_))));
        assert!(ops.iter().any(|op| matches!(op, Operation::Contains(_))));
        assert!(ops.iter().any(|op| matches!(op, Operation::Query { .. })));
        assert!(ops.iter().any(|op| matches!(op, Operation::Reopen)));
    }

    #[test]
    fn test_invalid_term_rate() {
        let config = OpGenConfig {
            invalid_term_rate: 1.0,
            remove_weight: 0,
            contains_weight: 0,
            query_weight: 0,
            reopen_weight: 0,
            ..OpGenConfig::default()
        };
        let mut generator = OperationGenerator::with_config(3, config);

        for _ in 0..20 {
            let Operation::Add(triple) = generator.next_operation() else {
                panic!("expected an add");
            };
            let terms = [&triple.subject, &triple.predicate, &triple.object];
            assert!(
                terms
                    .iter()
                    .any(|term| term.iter().any(|&b| b == 0x00 || b == 0x7F))
            );
        }
    }
}
