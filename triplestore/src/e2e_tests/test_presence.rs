//! Test point lookups against adds and removes.

use crate::e2e_tests::helpers::*;
use crate::index::IndexKind;

#[test]
fn test_add_then_remove() {
    let mut test = TestStore::new();

    assert!(!test.contains("s", "p", "o"));
    test.add("s", "p", "o");
    assert!(test.contains("s", "p", "o"));
    test.remove("s", "p", "o");
    assert!(!test.contains("s", "p", "o"));
}

#[test]
fn test_remove_absent_triple_is_ok() {
    let mut test = TestStore::new();
    test.remove("never", "added", "this");
    test.add("s", "p", "o");
    test.remove("s", "p", "o");
    test.remove("s", "p", "o");
    assert_eq!(test.size(), 0);
}

#[test]
fn test_contains_needs_exact_match() {
    let mut test = TestStore::new();
    test.add("s", "p", "object");

    assert!(!test.contains("s", "p", "obj"));
    assert!(!test.contains("s", "p", "objects"));
    assert!(!test.contains("s", "pp", "object"));
}

#[test]
fn test_fully_bound_query_finds_one_match_in_every_index() {
    let mut test = TestStore::new();
    test.add("s", "p", "o");
    test.add("s", "p", "o2");
    test.add("s2", "p", "o");

    let target = triple("s", "p", "o");
    for index in IndexKind::ALL {
        assert!(test.store().index_contains(index, &target), "missing from {index}");
    }
    assert_eq!(test.query(Some("s"), Some("p"), Some("o")), vec![target]);
}

#[test]
fn test_remove_clears_every_index() {
    let mut test = TestStore::new();
    test.add("s", "p", "o");
    test.remove("s", "p", "o");

    let target = triple("s", "p", "o");
    for index in IndexKind::ALL {
        assert!(!test.store().index_contains(index, &target), "left in {index}");
    }
    assert!(test.query(None, Some("p"), None).is_empty());
    assert!(test.query(None, None, Some("o")).is_empty());
}
