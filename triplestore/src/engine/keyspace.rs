//! Keyspaces and bounded cursors.
//!
//! A keyspace is an independently ordered map from key bytes to value bytes.
//! Keys sort by plain byte-lexicographic order, so a key that is a prefix of
//! another sorts first.

use std::collections::BTreeMap;
use std::collections::btree_map::Range;
use std::ops::Bound;

/// Identifier of a keyspace within an engine (its creation order).
pub type KeyspaceId = u32;

/// An ordered map of keys within one engine.
#[derive(Debug)]
pub struct Keyspace {
    id: KeyspaceId,
    name: String,
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl Keyspace {
    /// Create an empty keyspace.
    #[must_use]
    pub const fn new(id: KeyspaceId, name: String) -> Self {
        Self {
            id,
            name,
            entries: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> KeyspaceId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of keys currently stored.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // BTreeMap::len is not const-stable
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // BTreeMap::is_empty is not const-stable
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get a value by key.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Insert or replace an entry.
    ///
    /// Returns the old value if one was replaced.
    pub fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) -> Option<Vec<u8>> {
        self.entries.insert(key, value)
    }

    /// Remove an entry by key.
    pub fn remove(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.remove(key)
    }

    /// Iterate over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    /// Create an unpositioned cursor over this keyspace.
    #[must_use]
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor {
            entries: &self.entries,
            range: self.entries.range::<[u8], _>(..),
            current: None,
        }
    }
}

/// A handle to an open keyspace.
///
/// Handles are issued by `Engine::open` and given back with
/// `Engine::release`. They are deliberately not `Clone`.
#[derive(Debug, PartialEq, Eq)]
pub struct KeyspaceHandle {
    id: KeyspaceId,
    name: String,
}

impl KeyspaceHandle {
    pub(crate) const fn new(id: KeyspaceId, name: String) -> Self {
        Self { id, name }
    }

    #[must_use]
    pub const fn id(&self) -> KeyspaceId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A cursor over the sorted keys of one keyspace.
///
/// A new cursor is unpositioned; call `seek_to_first` or `seek` before
/// reading. Once `valid` returns false the cursor stays exhausted until it
/// is repositioned.
pub struct Cursor<'a> {
    entries: &'a BTreeMap<Vec<u8>, Vec<u8>>,
    range: Range<'a, Vec<u8>, Vec<u8>>,
    current: Option<(&'a Vec<u8>, &'a Vec<u8>)>,
}

impl<'a> Cursor<'a> {
    /// Position at the first key of the keyspace.
    pub fn seek_to_first(&mut self) {
        self.range = self.entries.range::<[u8], _>(..);
        self.current = self.range.next();
    }

    /// Position at the first key that is `>= target`.
    pub fn seek(&mut self, target: &[u8]) {
        self.range = self
            .entries
            .range::<[u8], _>((Bound::Included(target), Bound::Unbounded));
        self.current = self.range.next();
    }

    /// Step to the next key.
    pub fn next(&mut self) {
        if self.current.is_some() {
            self.current = self.range.next();
        }
    }

    /// Whether the cursor references an entry.
    #[must_use]
    pub const fn valid(&self) -> bool {
        self.current.is_some()
    }

    /// Key at the current position.
    #[must_use]
    pub fn key(&self) -> Option<&'a [u8]> {
        self.current.map(|(key, _)| key.as_slice())
    }

    /// Value at the current position.
    #[must_use]
    pub fn value(&self) -> Option<&'a [u8]> {
        self.current.map(|(_, value)| value.as_slice())
    }
}

impl std::fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("current", &self.key())
            .finish_non_exhaustive()
    }
}
