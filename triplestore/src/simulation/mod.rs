//! Deterministic simulation testing for the triple store.
//!
//! A seeded generator drives random adds, removes, lookups, queries and
//! reopens against a real store in a temporary directory. After every
//! operation the store is compared with an in-memory model.
//!
//! # Design Principles
//!
//! 1. All randomness is seeded for reproducibility
//! 2. Given the same seed, execution is identical
//! 3. Every answer from the store is checked against the model
//!
//! # Usage
//!
//! ```ignore
//! use simulation::simulator::{Simulator, SimulatorConfig};
//!
//! let config = SimulatorConfig::new(12345).with_invalid_term_rate(0.05);
//!
//! let mut sim = Simulator::new(config);
//! let result = sim.run(1000);
//!
//! assert!(result.passed());
//! ```

mod invariants;
mod op_gen;
mod simulator;
