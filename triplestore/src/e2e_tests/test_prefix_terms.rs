//! Test that bounds keep terms sharing a prefix apart.

use crate::e2e_tests::helpers::*;
use crate::index::plan_scan;

fn fixture() -> TestStore {
    let mut test = TestStore::new();
    for (s, p, o) in [
        ("u:ex:s1", "u:ex:p1", "u:ex:o1"),
        ("u:ex:s1", "u:ex:p1", "u:ex:o10"),
        ("u:ex:s1", "u:ex:p10", "u:ex:o1"),
        ("u:ex:s10", "u:ex:p1", "u:ex:o1"),
        ("u:ex:s1~", "u:ex:p1", "u:ex:o1"),
    ] {
        test.add(s, p, o);
    }
    test
}

#[test]
fn test_fully_bound_query_excludes_longer_object() {
    let test = fixture();
    assert_eq!(
        test.query(Some("u:ex:s1"), Some("u:ex:p1"), Some("u:ex:o1")),
        vec![triple("u:ex:s1", "u:ex:p1", "u:ex:o1")]
    );
}

#[test]
fn test_subject_query_excludes_longer_subjects() {
    let test = fixture();
    let results = test.query(Some("u:ex:s1"), None, None);
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|t| t.subject == b"u:ex:s1"));
}

#[test]
fn test_predicate_query_excludes_longer_predicates() {
    let test = fixture();
    let results = test.query(None, Some("u:ex:p1"), None);
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|t| t.predicate == b"u:ex:p1"));
}

#[test]
fn test_results_stay_inside_scan_bounds() {
    let test = fixture();
    let patterns = [
        pattern(Some("u:ex:s1"), None, None),
        pattern(Some("u:ex:s1"), Some("u:ex:p1"), None),
        pattern(Some("u:ex:s1"), None, Some("u:ex:o1")),
        pattern(None, Some("u:ex:p1"), Some("u:ex:o1")),
        pattern(None, None, Some("u:ex:o10")),
        pattern(Some("u:ex:s1"), Some("u:ex:p1"), Some("u:ex:o1")),
    ];

    for pattern in patterns {
        let plan = plan_scan(&pattern);
        let results = test.query(
            pattern.subject.map(|t| std::str::from_utf8(t).unwrap()),
            pattern.predicate.map(|t| std::str::from_utf8(t).unwrap()),
            pattern.object.map(|t| std::str::from_utf8(t).unwrap()),
        );
        assert!(!results.is_empty(), "pattern {pattern}");
        for t in &results {
            let key = plan.index.encode(&t.subject, &t.predicate, &t.object);
            assert!(plan.contains(&key), "pattern {pattern} visited {t:?}");
            assert!(pattern.matches(t), "pattern {pattern} returned {t:?}");
        }
    }
}
