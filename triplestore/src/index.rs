//! Physical index orderings and index selection.
//!
//! Every triple is stored three times, once per ordering:
//!
//! | Index | Keyspace | Stored order |
//! |-------|----------|--------------|
//! | SPO   | `spo`    | (s, p, o)    |
//! | POS   | `pos`    | (p, o, s)    |
//! | OSP   | `osp`    | (o, s, p)    |
//!
//! A query scans the one index whose stored order places all of the
//! pattern's bound fields at the front of the key, so the scan covers a
//! single contiguous key range.

use crate::codec::{self, KeyError, SEPARATOR};
use crate::types::{Field, Pattern};

/// One of the three physical index orderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    Spo,
    Pos,
    Osp,
}

impl IndexKind {
    /// All indexes, in the order their keyspaces are opened.
    pub const ALL: [Self; 3] = [Self::Spo, Self::Pos, Self::Osp];

    /// Name of the keyspace holding this index.
    #[must_use]
    pub const fn keyspace_name(self) -> &'static str {
        match self {
            Self::Spo => "spo",
            Self::Pos => "pos",
            Self::Osp => "osp",
        }
    }

    /// Position of this index in [`IndexKind::ALL`].
    #[must_use]
    pub const fn as_index(self) -> usize {
        match self {
            Self::Spo => 0,
            Self::Pos => 1,
            Self::Osp => 2,
        }
    }

    /// Logical fields in stored key order.
    #[must_use]
    pub const fn stored_order(self) -> [Field; 3] {
        match self {
            Self::Spo => [Field::Subject, Field::Predicate, Field::Object],
            Self::Pos => [Field::Predicate, Field::Object, Field::Subject],
            Self::Osp => [Field::Object, Field::Subject, Field::Predicate],
        }
    }

    /// Encode a logical triple into this index's key.
    #[must_use]
    pub fn encode(self, subject: &[u8], predicate: &[u8], object: &[u8]) -> Vec<u8> {
        match self {
            Self::Spo => codec::encode_key(subject, predicate, object),
            Self::Pos => codec::encode_key(predicate, object, subject),
            Self::Osp => codec::encode_key(object, subject, predicate),
        }
    }

    /// Reorder fields read from a stored key into (s, p, o).
    #[must_use]
    pub fn to_logical<T: Copy>(self, stored: [T; 3]) -> [T; 3] {
        match self {
            Self::Spo => stored,
            Self::Pos => [stored[2], stored[0], stored[1]],
            Self::Osp => [stored[1], stored[2], stored[0]],
        }
    }

    /// Decode a key from this index into logical (s, p, o) order.
    pub fn decode(self, key: &[u8]) -> Result<[&[u8]; 3], KeyError> {
        codec::decode_key(key).map(|stored| self.to_logical(stored))
    }
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyspace_name())
    }
}

/// Choose the index whose stored order puts every bound field first.
///
/// SPO is used whenever no other index gives a longer bound prefix,
/// including the full scan.
#[must_use]
pub const fn select_index(pattern: &Pattern<'_>) -> IndexKind {
    match (
        pattern.subject.is_some(),
        pattern.predicate.is_some(),
        pattern.object.is_some(),
    ) {
        (true, false, true) | (false, false, true) => IndexKind::Osp,
        (false, true, _) => IndexKind::Pos,
        _ => IndexKind::Spo,
    }
}

/// The key range a query scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPlan {
    pub index: IndexKind,
    /// Inclusive lower bound.
    pub start: Vec<u8>,
    /// Exclusive upper bound.
    pub limit: Vec<u8>,
}

impl ScanPlan {
    /// Whether `key` falls inside `[start, limit)`.
    #[must_use]
    pub fn contains(&self, key: &[u8]) -> bool {
        self.start.as_slice() <= key && key < self.limit.as_slice()
    }
}

/// Select an index for `pattern` and compute its scan bounds.
///
/// When every field is bound the limit is the exact key followed by a
/// separator, so objects that merely start with the bound object are
/// excluded.
#[must_use]
pub fn plan_scan(pattern: &Pattern<'_>) -> ScanPlan {
    let index = select_index(pattern);
    let [first, second, third] = index.stored_order().map(|field| pattern.get(field));

    let start = codec::encode_start(first, second, third);
    let limit = if third.is_some() {
        let mut limit = start.clone();
        limit.push(SEPARATOR);
        limit
    } else {
        codec::encode_limit(first, second, third)
    };

    ScanPlan {
        index,
        start,
        limit,
    }
}
