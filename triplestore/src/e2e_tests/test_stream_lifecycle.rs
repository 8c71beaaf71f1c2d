//! Test stream accessors, exhaustion and iteration.

use crate::e2e_tests::helpers::*;
use crate::stream::StreamError;

#[test]
fn test_accessors_fail_after_end() {
    let mut test = TestStore::new();
    test.add("s", "p", "o");

    let mut stream = test.store().serialise().unwrap();
    assert_eq!(stream.triple().unwrap(), triple("s", "p", "o"));

    stream.advance();
    assert!(stream.at_end());
    assert_eq!(stream.subject(), Err(StreamError::IteratorInvalid));
    assert_eq!(stream.predicate(), Err(StreamError::IteratorInvalid));
    assert_eq!(stream.object(), Err(StreamError::IteratorInvalid));

    stream.advance();
    assert!(stream.at_end());
}

#[test]
fn test_query_with_no_matches_starts_at_end() {
    let mut test = TestStore::new();
    test.add("s", "p", "o");

    let stream = test.store().query(&pattern(Some("t"), None, None)).unwrap();
    assert!(stream.at_end());
    assert_eq!(stream.triple(), Err(StreamError::IteratorInvalid));
}

#[test]
fn test_iterator_and_manual_walk_agree() {
    let mut test = TestStore::new();
    for i in 0..10 {
        test.add("s", "p", &format!("o{i}"));
    }

    let mut manual = Vec::new();
    let mut stream = test.store().query(&pattern(Some("s"), None, None)).unwrap();
    while !stream.at_end() {
        manual.push(stream.triple().unwrap());
        stream.advance();
    }
    stream.free();

    let iterated = test.query(Some("s"), None, None);
    assert_eq!(manual, iterated);
    assert_eq!(manual.len(), 10);
}

#[test]
fn test_several_streams_can_be_open_at_once() {
    let mut test = TestStore::new();
    test.add("a", "p", "x");
    test.add("b", "q", "x");

    let store = test.store();
    let by_subject = store.query(&pattern(Some("a"), None, None)).unwrap();
    let by_object = store.query(&pattern(None, None, Some("x"))).unwrap();

    assert_eq!(by_subject.count(), 1);
    assert_eq!(by_object.count(), 2);
}

#[test]
fn test_accessors_borrow_from_store() {
    let mut test = TestStore::new();
    test.add("subject", "predicate", "object");

    let store = test.store();
    let subject = {
        let stream = store.serialise().unwrap();
        stream.subject().unwrap()
    };
    // The term outlives the stream it was read from
    assert_eq!(subject, b"subject");
}
