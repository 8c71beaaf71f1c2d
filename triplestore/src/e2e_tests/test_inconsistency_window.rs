//! Document what a failed write leaves behind.
//!
//! The three index writes of an add or remove are independent. A failure
//! part way through is reported, and the writes that already happened stay.

use crate::e2e_tests::helpers::*;
use crate::index::IndexKind;
use crate::store::StoreError;

#[test]
fn test_failed_add_leaves_earlier_indexes_written() {
    let mut test = TestStore::new();
    test.store_mut().fail_writes_after(2);

    let result = test.store_mut().add(b"s", b"p", b"o");
    assert!(matches!(
        result,
        Err(StoreError::Write {
            index: IndexKind::Osp,
            ..
        })
    ));

    let target = triple("s", "p", "o");
    let store = test.store();
    assert!(store.index_contains(IndexKind::Spo, &target));
    assert!(store.index_contains(IndexKind::Pos, &target));
    assert!(!store.index_contains(IndexKind::Osp, &target));

    // The indexes now disagree
    assert!(test.contains("s", "p", "o"));
    assert_eq!(test.query(None, Some("p"), None).len(), 1);
    assert!(test.query(None, None, Some("o")).is_empty());
}

#[test]
fn test_failed_remove_leaves_later_indexes_intact() {
    let mut test = TestStore::new();
    test.add("s", "p", "o");
    test.store_mut().fail_writes_after(1);

    let result = test.store_mut().remove(b"s", b"p", b"o");
    assert!(matches!(
        result,
        Err(StoreError::Write {
            index: IndexKind::Pos,
            ..
        })
    ));

    assert!(!test.contains("s", "p", "o"));
    assert_eq!(test.query(None, Some("p"), None).len(), 1);
    assert_eq!(test.query(None, None, Some("o")).len(), 1);
}

#[test]
fn test_first_write_failure_changes_nothing() {
    let mut test = TestStore::new();
    test.store_mut().fail_writes_after(0);

    let result = test.store_mut().add(b"s", b"p", b"o");
    assert!(matches!(
        result,
        Err(StoreError::Write {
            index: IndexKind::Spo,
            ..
        })
    ));
    assert!(!test.contains("s", "p", "o"));
    assert!(test.all().is_empty());
}
