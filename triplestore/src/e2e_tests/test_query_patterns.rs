//! Test every combination of bound fields against one fixture.

use crate::e2e_tests::helpers::*;
use crate::index::IndexKind;

fn fixture() -> TestStore {
    let mut test = TestStore::new();
    test.add("alice", "knows", "bob");
    test.add("alice", "knows", "carol");
    test.add("alice", "likes", "bob");
    test.add("bob", "knows", "carol");
    test.add("carol", "likes", "alice");
    test
}

#[test]
fn test_fully_bound() {
    let test = fixture();
    assert_eq!(
        test.query(Some("alice"), Some("knows"), Some("bob")),
        vec![triple("alice", "knows", "bob")]
    );
    assert!(test.query(Some("alice"), Some("knows"), Some("dave")).is_empty());
}

#[test]
fn test_subject_predicate() {
    let test = fixture();
    assert_eq!(
        test.query(Some("alice"), Some("knows"), None),
        vec![triple("alice", "knows", "bob"), triple("alice", "knows", "carol")]
    );
}

#[test]
fn test_subject_object() {
    let test = fixture();
    // OSP order: predicates ascend within the (object, subject) prefix
    assert_eq!(
        test.query(Some("alice"), None, Some("bob")),
        vec![triple("alice", "knows", "bob"), triple("alice", "likes", "bob")]
    );
}

#[test]
fn test_subject_only() {
    let test = fixture();
    assert_eq!(
        test.query(Some("alice"), None, None),
        vec![
            triple("alice", "knows", "bob"),
            triple("alice", "knows", "carol"),
            triple("alice", "likes", "bob"),
        ]
    );
}

#[test]
fn test_predicate_object() {
    let test = fixture();
    // POS order: subjects ascend within the (predicate, object) prefix
    assert_eq!(
        test.query(None, Some("knows"), Some("carol")),
        vec![triple("alice", "knows", "carol"), triple("bob", "knows", "carol")]
    );
}

#[test]
fn test_predicate_only() {
    let test = fixture();
    // POS order: objects first, then subjects
    assert_eq!(
        test.query(None, Some("likes"), None),
        vec![triple("carol", "likes", "alice"), triple("alice", "likes", "bob")]
    );
}

#[test]
fn test_object_only() {
    let test = fixture();
    // OSP order: subjects first, then predicates
    assert_eq!(
        test.query(None, None, Some("bob")),
        vec![triple("alice", "knows", "bob"), triple("alice", "likes", "bob")]
    );
    assert_eq!(
        test.query(None, None, Some("carol")),
        vec![triple("alice", "knows", "carol"), triple("bob", "knows", "carol")]
    );
}

#[test]
fn test_nothing_bound() {
    let test = fixture();
    assert_eq!(test.all().len(), 5);
}

#[test]
fn test_streams_report_chosen_index() {
    let test = fixture();
    let cases = [
        ((Some("alice"), Some("knows"), Some("bob")), IndexKind::Spo),
        ((Some("alice"), Some("knows"), None), IndexKind::Spo),
        ((Some("alice"), None, Some("bob")), IndexKind::Osp),
        ((Some("alice"), None, None), IndexKind::Spo),
        ((None, Some("knows"), Some("bob")), IndexKind::Pos),
        ((None, Some("knows"), None), IndexKind::Pos),
        ((None, None, Some("bob")), IndexKind::Osp),
        ((None, None, None), IndexKind::Spo),
    ];

    for ((s, p, o), expected) in cases {
        let stream = test.store().query(&pattern(s, p, o)).unwrap();
        assert_eq!(stream.index(), expected, "pattern s={s:?} p={p:?} o={o:?}");
    }
}

#[test]
fn test_every_pattern_agrees_with_filtering_a_full_scan() {
    let test = fixture();
    let all = test.all();
    let terms = [None, Some("alice"), Some("bob"), Some("carol"), Some("knows"), Some("likes")];

    for s in terms {
        for p in terms {
            for o in terms {
                let pattern = pattern(s, p, o);
                let mut expected: Vec<_> =
                    all.iter().filter(|t| pattern.matches(t)).cloned().collect();
                let mut actual = test.query(s, p, o);
                expected.sort();
                actual.sort();
                assert_eq!(actual, expected, "pattern {pattern}");
            }
        }
    }
}
