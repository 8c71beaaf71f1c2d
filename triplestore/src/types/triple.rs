use crate::codec::{LIMIT_SENTINEL, SEPARATOR};

/// A position within a triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Subject,
    Predicate,
    Object,
}

impl Field {
    /// All fields in logical order.
    pub const ALL: [Self; 3] = [Self::Subject, Self::Predicate, Self::Object];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Predicate => "predicate",
            Self::Object => "object",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An owned (subject, predicate, object) record.
///
/// Terms are opaque bytes. Two triples are equal when all three terms are
/// byte-equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Triple {
    pub subject: Vec<u8>,
    pub predicate: Vec<u8>,
    pub object: Vec<u8>,
}

impl Triple {
    #[must_use]
    pub fn new(
        subject: impl Into<Vec<u8>>,
        predicate: impl Into<Vec<u8>>,
        object: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Get a term by field.
    #[must_use]
    pub fn get(&self, field: Field) -> &[u8] {
        match field {
            Field::Subject => &self.subject,
            Field::Predicate => &self.predicate,
            Field::Object => &self.object,
        }
    }
}

/// Why a term cannot be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermViolation {
    /// Term contains the key field separator.
    ContainsSeparator { position: usize },
    /// Term contains a byte at or above the scan limit sentinel.
    ByteOutOfRange { position: usize, byte: u8 },
}

impl std::fmt::Display for TermViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContainsSeparator { position } => {
                write!(f, "contains separator byte 0x00 at position {position}")
            }
            Self::ByteOutOfRange { position, byte } => write!(
                f,
                "byte 0x{byte:02x} at position {position} is not below 0x{LIMIT_SENTINEL:02x}"
            ),
        }
    }
}

/// Check that a term can be stored in an index key.
///
/// # Errors
///
/// Returns the first offending byte found in `term`.
pub fn check_term(term: &[u8]) -> Result<(), TermViolation> {
    for (position, &byte) in term.iter().enumerate() {
        if byte == SEPARATOR {
            return Err(TermViolation::ContainsSeparator { position });
        }
        if byte >= LIMIT_SENTINEL {
            return Err(TermViolation::ByteOutOfRange { position, byte });
        }
    }
    Ok(())
}
