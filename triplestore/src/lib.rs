// Life of a query:
// 1. Pattern comes in with some of (s, p, o) bound
// 2. Pick the index whose key order puts the bound fields first
// 3. Build the [start, limit) key range from the bound prefix
// 4. Seek an engine cursor to start and stream records until limit
// 5. Decode each key and reorder its fields back into (s, p, o)
//
// System components:
//  - Key-value engine with named keyspaces, persisted as a CRC-framed log
//  - Key codec and index selection
//  - Store and result streams

pub mod codec;
pub mod config;
pub mod engine;
pub mod index;
pub mod storage;
pub mod store;
pub mod stream;
pub mod types;

mod e2e_tests;
#[cfg(test)]
mod simulation;
#[cfg(test)]
mod testing;

pub use config::{ConfigError, StoreConfig};
pub use storage::TripleStorage;
pub use store::{Store, StoreError};
pub use stream::{Stream, StreamError};
pub use types::{Field, Pattern, Triple};
