//! Test full scans: ordering, counts and duplicate adds.

use crate::e2e_tests::helpers::*;

#[test]
fn test_full_scan_is_sorted_by_subject_predicate_object() {
    let mut test = TestStore::new();
    test.add("b", "p", "o");
    test.add("a", "q", "o");
    test.add("a", "p", "z");
    test.add("a", "p", "a");
    test.add("ab", "p", "o");

    assert_eq!(
        test.all(),
        vec![
            triple("a", "p", "a"),
            triple("a", "p", "z"),
            triple("a", "q", "o"),
            triple("ab", "p", "o"),
            triple("b", "p", "o"),
        ]
    );
}

#[test]
fn test_serialise_matches_unbound_query() {
    let mut test = TestStore::new();
    test.add("s1", "p", "o");
    test.add("s2", "p", "o");

    let serialised: Vec<_> = test
        .store()
        .serialise()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(serialised, test.all());
}

#[test]
fn test_count_is_adds_minus_removes() {
    let mut test = TestStore::new();
    for i in 0..20 {
        test.add(&format!("s{i}"), "p", "o");
    }
    // Duplicates do not add records
    test.add("s0", "p", "o");
    test.add("s1", "p", "o");
    for i in 0..5 {
        test.remove(&format!("s{i}"), "p", "o");
    }

    assert_eq!(test.all().len(), 15);
    assert_eq!(test.size(), 15);
}

#[test]
fn test_empty_store() {
    let test = TestStore::new();
    assert!(test.all().is_empty());
    assert_eq!(test.size(), 0);

    let stream = test.store().serialise().unwrap();
    assert!(stream.at_end());
}

#[test]
fn test_empty_terms_are_ordinary_terms() {
    let mut test = TestStore::new();
    test.add("", "", "");
    test.add("", "p", "");
    test.add("s", "", "o");

    assert_eq!(
        test.all(),
        vec![triple("", "", ""), triple("", "p", ""), triple("s", "", "o")]
    );
    assert_eq!(test.query(Some(""), None, None).len(), 2);
    assert_eq!(test.query(None, None, Some("")).len(), 2);
}
