//! Test that data survives closing and reopening the store.

use std::fs::OpenOptions;
use std::io::Write;

use crate::e2e_tests::helpers::*;
use crate::engine::LOG_FILE_NAME;
use crate::store::{Store, StoreError};

#[test]
fn test_reopen_keeps_triples() {
    let mut test = TestStore::new();
    test.add("s1", "p", "o1");
    test.add("s1", "p", "o2");
    test.add("s2", "p", "o1");
    test.remove("s2", "p", "o1");

    test.reopen();

    assert_eq!(
        test.all(),
        vec![triple("s1", "p", "o1"), triple("s1", "p", "o2")]
    );
    assert_eq!(test.size(), 2);
    assert_eq!(test.query(None, None, Some("o2")).len(), 1);
}

#[test]
fn test_create_fresh_wipes_existing_data() {
    let mut test = TestStore::new();
    test.add("s", "p", "o");
    test.close();

    test.open_with(|config| config.with_create_fresh(true));

    assert!(test.all().is_empty());
    assert_eq!(test.size(), 0);
}

#[test]
fn test_open_without_fresh_creates_missing_location() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let location = dir.path().join("nested").join("store");

    let mut store = Store::open(&location, false).unwrap();
    store.add(b"s", b"p", b"o").unwrap();
    store.close().unwrap();

    assert!(location.join(LOG_FILE_NAME).exists());
}

#[test]
fn test_open_rejects_foreign_data() {
    let dir = tempfile::tempdir().expect("create temp dir");
    std::fs::write(dir.path().join(LOG_FILE_NAME), b"definitely not a log file").unwrap();

    let result = Store::open(dir.path(), false);
    assert!(matches!(result, Err(StoreError::Open(_))));
}

#[test]
fn test_torn_log_tail_is_discarded() {
    let mut test = TestStore::new();
    test.add("s1", "p", "o");
    test.add("s2", "p", "o");
    test.close();

    // Simulate a crash part way through appending a record
    let mut file = OpenOptions::new()
        .append(true)
        .open(test.location().join(LOG_FILE_NAME))
        .unwrap();
    file.write_all(&[0x40, 0x00, 0x00, 0x00, 0x02, b'x']).unwrap();
    drop(file);

    test.open_with(|config| config);
    assert_eq!(test.all(), vec![triple("s1", "p", "o"), triple("s2", "p", "o")]);

    // Appends after recovery land on a clean tail
    test.add("s3", "p", "o");
    test.reopen();
    assert_eq!(test.size(), 3);
}

#[test]
fn test_compaction_on_close_keeps_live_triples() {
    let mut test = TestStore::new();
    test.close();
    test.open_with(|config| config.with_compaction_bytes(1));

    for i in 0..50 {
        test.add(&format!("s{i}"), "p", "o");
    }
    for i in 0..45 {
        test.remove(&format!("s{i}"), "p", "o");
    }
    let before = std::fs::metadata(test.location().join(LOG_FILE_NAME))
        .unwrap()
        .len();

    test.reopen();

    let after = std::fs::metadata(test.location().join(LOG_FILE_NAME))
        .unwrap()
        .len();
    assert!(after < before, "log did not shrink: {before} -> {after}");
    assert_eq!(test.size(), 5);
    assert_eq!(test.all().first(), Some(&triple("s45", "p", "o")));
}

#[test]
fn test_sync_mode_round_trips() {
    let mut test = TestStore::new();
    test.close();
    test.open_with(|config| config.with_sync(true));

    test.add("s", "p", "o");
    test.reopen();
    assert!(test.contains("s", "p", "o"));
}
