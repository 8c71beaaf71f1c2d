//! Test that terms the key encoding cannot represent are rejected.

use crate::e2e_tests::helpers::*;
use crate::store::StoreError;
use crate::types::{Field, Pattern, TermViolation};

#[test]
fn test_separator_in_term_is_rejected() {
    let mut test = TestStore::new();

    let result = test.store_mut().add(b"s", b"p", b"o\0o");
    assert!(matches!(
        result,
        Err(StoreError::InvalidTerm {
            field: Field::Object,
            reason: TermViolation::ContainsSeparator { position: 1 }
        })
    ));
    assert!(test.all().is_empty());
}

#[test]
fn test_high_bytes_are_rejected() {
    let mut test = TestStore::new();

    for bad in [b"\x7f".as_slice(), b"\x80", "caf\u{e9}".as_bytes()] {
        let result = test.store_mut().add(bad, b"p", b"o");
        assert!(
            matches!(
                result,
                Err(StoreError::InvalidTerm {
                    field: Field::Subject,
                    reason: TermViolation::ByteOutOfRange { .. }
                })
            ),
            "term {bad:?}"
        );
    }
    assert_eq!(test.size(), 0);
}

#[test]
fn test_remove_and_contains_check_terms() {
    let mut test = TestStore::new();

    assert!(matches!(
        test.store_mut().remove(b"s", b"p\0", b"o"),
        Err(StoreError::InvalidTerm {
            field: Field::Predicate,
            ..
        })
    ));
    assert!(matches!(
        test.store().contains(b"s", b"p", b"\xff"),
        Err(StoreError::InvalidTerm {
            field: Field::Object,
            ..
        })
    ));
}

#[test]
fn test_query_checks_bound_terms() {
    let test = TestStore::new();
    let result = test.store().query(&Pattern::any().with_subject(b"a\0b"));
    assert!(matches!(
        result,
        Err(StoreError::InvalidTerm {
            field: Field::Subject,
            ..
        })
    ));
}

#[test]
fn test_error_message_names_field() {
    let mut test = TestStore::new();
    let error = test.store_mut().add(b"s", b"p\x7f", b"o").unwrap_err();
    assert_eq!(
        error.to_string(),
        "invalid predicate: byte 0x7f at position 1 is not below 0x7f"
    );
}
