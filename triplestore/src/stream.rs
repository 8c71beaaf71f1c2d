//! Streaming query results.
//!
//! A [`Stream`] walks one index keyspace over a `[start, limit)` key range
//! and exposes each record as a logical (subject, predicate, object) triple.
//! The accessors borrow straight from the engine's stored keys.
//!
//! A stream borrows the store it was created from, so the store cannot be
//! written to or closed while the stream is alive.

use crate::codec::KeyError;
use crate::engine::Cursor;
use crate::index::{IndexKind, ScanPlan};
use crate::types::{Field, Triple};

enum State<'a> {
    /// Cursor is on an in-range record, decoded into logical order.
    Positioned([&'a [u8]; 3]),
    /// Cursor is on an in-range record whose key cannot be decoded.
    Malformed(KeyError),
    AtEnd,
}

/// Cursor over the triples matching a query.
pub struct Stream<'a> {
    cursor: Cursor<'a>,
    index: IndexKind,
    limit: Vec<u8>,
    state: State<'a>,
}

impl<'a> Stream<'a> {
    /// Position a cursor at the start of `plan` and load the first record.
    pub(crate) fn new(mut cursor: Cursor<'a>, plan: ScanPlan) -> Self {
        if plan.start.is_empty() {
            cursor.seek_to_first();
        } else {
            cursor.seek(&plan.start);
        }

        let mut stream = Self {
            cursor,
            index: plan.index,
            limit: plan.limit,
            state: State::AtEnd,
        };
        stream.load_current();
        stream
    }

    /// Move to the next matching triple. Does nothing at the end.
    pub fn advance(&mut self) {
        if self.at_end() {
            return;
        }
        self.cursor.next();
        self.load_current();
    }

    /// Whether the stream has run past its last matching triple.
    #[must_use]
    pub const fn at_end(&self) -> bool {
        matches!(self.state, State::AtEnd)
    }

    /// The index this stream scans.
    #[must_use]
    pub const fn index(&self) -> IndexKind {
        self.index
    }

    pub fn subject(&self) -> Result<&'a [u8], StreamError> {
        self.field(Field::Subject)
    }

    pub fn predicate(&self) -> Result<&'a [u8], StreamError> {
        self.field(Field::Predicate)
    }

    pub fn object(&self) -> Result<&'a [u8], StreamError> {
        self.field(Field::Object)
    }

    /// Copy out the current triple.
    pub fn triple(&self) -> Result<Triple, StreamError> {
        let [subject, predicate, object] = self.fields()?;
        Ok(Triple::new(subject, predicate, object))
    }

    /// Release the stream and its cursor.
    pub fn free(self) {
        tracing::trace!("Freeing stream over {} index", self.index);
    }

    fn field(&self, field: Field) -> Result<&'a [u8], StreamError> {
        let fields = self.fields()?;
        Ok(match field {
            Field::Subject => fields[0],
            Field::Predicate => fields[1],
            Field::Object => fields[2],
        })
    }

    const fn fields(&self) -> Result<[&'a [u8]; 3], StreamError> {
        match self.state {
            State::Positioned(fields) => Ok(fields),
            State::Malformed(e) => Err(StreamError::Malformed(e)),
            State::AtEnd => Err(StreamError::IteratorInvalid),
        }
    }

    fn load_current(&mut self) {
        self.state = match self.cursor.key() {
            Some(key) if key < self.limit.as_slice() => match self.index.decode(key) {
                Ok(fields) => State::Positioned(fields),
                Err(e) => State::Malformed(e),
            },
            _ => State::AtEnd,
        };
    }
}

impl Iterator for Stream<'_> {
    type Item = Result<Triple, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.at_end() {
            return None;
        }
        let item = self.triple();
        self.advance();
        Some(item)
    }
}

impl std::fmt::Debug for Stream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("index", &self.index)
            .field("cursor", &self.cursor)
            .field("at_end", &self.at_end())
            .finish_non_exhaustive()
    }
}

/// Errors returned by stream accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    /// The stream is not positioned on a record.
    IteratorInvalid,
    /// The current record's key could not be decoded.
    Malformed(KeyError),
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IteratorInvalid => write!(f, "stream is not positioned on a triple"),
            Self::Malformed(e) => write!(f, "stored key is malformed: {e}"),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IteratorInvalid => None,
            Self::Malformed(e) => Some(e),
        }
    }
}
