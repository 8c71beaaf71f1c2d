//! Composite key encoding for index records.
//!
//! A record key is three terms joined by [`SEPARATOR`]:
//!
//! ```text
//! [first][0x00][second][0x00][third]
//! ```
//!
//! There is no trailing separator. Decoding splits on the first two
//! separators only, so the third field keeps any further `0x00` bytes.
//!
//! Scan bounds are built from the bound prefix of a key. The lower bound
//! is inclusive; the upper bound appends [`LIMIT_SENTINEL`] and is exclusive.
//! Because terms only use bytes below the sentinel, every key that extends
//! the prefix sorts strictly below the limit.

/// Byte separating the fields of a composite key.
pub const SEPARATOR: u8 = 0x00;

/// Byte appended to a prefix to form an exclusive upper bound.
pub const LIMIT_SENTINEL: u8 = 0x7F;

/// Encode three terms into a composite key.
#[must_use]
pub fn encode_key(first: &[u8], second: &[u8], third: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(first.len() + second.len() + third.len() + 2);
    key.extend_from_slice(first);
    key.push(SEPARATOR);
    key.extend_from_slice(second);
    key.push(SEPARATOR);
    key.extend_from_slice(third);
    key
}

/// Split a composite key into its three fields.
///
/// The returned slices borrow from `key`.
///
/// # Errors
///
/// Returns `KeyError::Malformed` if the key has fewer than two separators.
pub fn decode_key(key: &[u8]) -> Result<[&[u8]; 3], KeyError> {
    let mut parts = key.splitn(3, |&byte| byte == SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(first), Some(second), Some(third)) => Ok([first, second, third]),
        _ => Err(KeyError::Malformed {
            separators: key.iter().filter(|&&byte| byte == SEPARATOR).count(),
        }),
    }
}

/// Build the inclusive lower bound for a prefix scan.
///
/// Fields are written strictly in prefix order: a field is only written if
/// every field before it is present. An absent first field gives an empty
/// bound, which starts the scan at the first key.
#[must_use]
pub fn encode_start(first: Option<&[u8]>, second: Option<&[u8]>, third: Option<&[u8]>) -> Vec<u8> {
    let mut bound = Vec::new();
    let Some(first) = first else {
        return bound;
    };
    bound.extend_from_slice(first);
    bound.push(SEPARATOR);

    let Some(second) = second else {
        return bound;
    };
    bound.extend_from_slice(second);
    bound.push(SEPARATOR);

    if let Some(third) = third {
        bound.extend_from_slice(third);
    }
    bound
}

/// Build the exclusive upper bound for a prefix scan.
#[must_use]
pub fn encode_limit(first: Option<&[u8]>, second: Option<&[u8]>, third: Option<&[u8]>) -> Vec<u8> {
    let mut bound = encode_start(first, second, third);
    bound.push(LIMIT_SENTINEL);
    bound
}

/// Error returned when a stored key cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyError {
    /// Key has fewer than two field separators.
    Malformed { separators: usize },
}

impl std::fmt::Display for KeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed { separators } => write!(
                f,
                "malformed key: expected 2 separators, found {separators}"
            ),
        }
    }
}

impl std::error::Error for KeyError {}
