//! Test the two-object lookup on a shared subject and predicate.

use crate::e2e_tests::helpers::*;

#[test]
fn test_subject_predicate_query_returns_both_objects_in_order() {
    let mut test = TestStore::new();

    test.add("u:ex:s1", "u:ex:p1", "u:ex:o2");
    test.add("u:ex:s1", "u:ex:p1", "u:ex:o1");
    // Neighbours that must not show up
    test.add("u:ex:s1", "u:ex:p2", "u:ex:o1");
    test.add("u:ex:s2", "u:ex:p1", "u:ex:o1");

    let results = test.query(Some("u:ex:s1"), Some("u:ex:p1"), None);

    assert_eq!(
        results,
        vec![
            triple("u:ex:s1", "u:ex:p1", "u:ex:o1"),
            triple("u:ex:s1", "u:ex:p1", "u:ex:o2"),
        ]
    );
}

#[test]
fn test_accessors_walk_the_results() {
    let mut test = TestStore::new();
    test.add("u:ex:s1", "u:ex:p1", "u:ex:o1");
    test.add("u:ex:s1", "u:ex:p1", "u:ex:o2");

    let pattern = pattern(Some("u:ex:s1"), Some("u:ex:p1"), None);
    let mut stream = test.store().query(&pattern).unwrap();

    let mut objects = Vec::new();
    while !stream.at_end() {
        assert_eq!(stream.subject().unwrap(), b"u:ex:s1");
        assert_eq!(stream.predicate().unwrap(), b"u:ex:p1");
        objects.push(stream.object().unwrap().to_vec());
        stream.advance();
    }
    stream.free();

    assert_eq!(objects, vec![b"u:ex:o1".to_vec(), b"u:ex:o2".to_vec()]);
}
