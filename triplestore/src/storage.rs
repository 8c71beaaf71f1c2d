//! The interface host code programs against.
//!
//! [`TripleStorage`] is the set of operations a host library needs from a
//! triple backend. [`Store`] is the only implementation.

use crate::store::{Store, StoreError};
use crate::stream::{Stream, StreamError};
use crate::types::{Pattern, Triple};

/// A backend that stores triples and answers pattern queries.
pub trait TripleStorage {
    /// Stream of query results, borrowing the storage.
    type Stream<'a>: Iterator<Item = Result<Triple, StreamError>>
    where
        Self: 'a;

    /// Estimated number of stored triples.
    fn size(&self) -> Result<u64, StoreError>;

    fn add(&mut self, subject: &[u8], predicate: &[u8], object: &[u8]) -> Result<(), StoreError>;

    fn remove(
        &mut self,
        subject: &[u8],
        predicate: &[u8],
        object: &[u8],
    ) -> Result<(), StoreError>;

    fn contains(&self, subject: &[u8], predicate: &[u8], object: &[u8]) -> Result<bool, StoreError>;

    fn query<'a>(&'a self, pattern: &Pattern<'_>) -> Result<Self::Stream<'a>, StoreError>;

    fn close(self) -> Result<(), StoreError>
    where
        Self: Sized;

    /// Collect every triple matching `pattern`.
    fn find(&self, pattern: &Pattern<'_>) -> Result<Vec<Triple>, StoreError> {
        self.query(pattern)?
            .map(|item| item.map_err(StoreError::from))
            .collect()
    }

    /// Count the triples matching `pattern` by scanning them.
    fn count(&self, pattern: &Pattern<'_>) -> Result<usize, StoreError> {
        let mut count = 0;
        for item in self.query(pattern)? {
            item?;
            count += 1;
        }
        Ok(count)
    }
}

impl TripleStorage for Store {
    type Stream<'a> = Stream<'a>;

    fn size(&self) -> Result<u64, StoreError> {
        Self::size(self)
    }

    fn add(&mut self, subject: &[u8], predicate: &[u8], object: &[u8]) -> Result<(), StoreError> {
        Self::add(self, subject, predicate, object)
    }

    fn remove(
        &mut self,
        subject: &[u8],
        predicate: &[u8],
        object: &[u8],
    ) -> Result<(), StoreError> {
        Self::remove(self, subject, predicate, object)
    }

    fn contains(&self, subject: &[u8], predicate: &[u8], object: &[u8]) -> Result<bool, StoreError> {
        Self::contains(self, subject, predicate, object)
    }

    fn query<'a>(&'a self, pattern: &Pattern<'_>) -> Result<Stream<'a>, StoreError> {
        Self::query(self, pattern)
    }

    fn close(self) -> Result<(), StoreError> {
        Self::close(self)
    }
}
