//! End-to-end tests at the store level.
//!
//! Each test file covers a specific scenario, using deterministic inputs
//! against a real store in a temporary directory.

#![cfg(test)]

mod helpers;

mod test_example_scenario;
mod test_full_scan;
mod test_inconsistency_window;
mod test_invalid_terms;
mod test_persistence;
mod test_prefix_terms;
mod test_presence;
mod test_query_patterns;
mod test_stream_lifecycle;
