//! Common helpers for end-to-end tests.

use std::path::PathBuf;

use tempfile::TempDir;

use crate::config::StoreConfig;
use crate::store::Store;
use crate::testing::init_tracing;
use crate::types::{Pattern, Triple};

/// A store in its own temporary directory.
///
/// The directory outlives the store, so the store can be closed and
/// reopened at the same location.
pub struct TestStore {
    dir: TempDir,
    store: Option<Store>,
}

impl TestStore {
    /// Create a test store with a fresh, empty location.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = Store::open(dir.path().join("store"), true).expect("open store");
        Self {
            dir,
            store: Some(store),
        }
    }

    /// The store's location.
    #[must_use]
    pub fn location(&self) -> PathBuf {
        self.dir.path().join("store")
    }

    #[allow(clippy::expect_used)]
    pub fn store(&self) -> &Store {
        self.store.as_ref().expect("store is open")
    }

    #[allow(clippy::expect_used)]
    pub fn store_mut(&mut self) -> &mut Store {
        self.store.as_mut().expect("store is open")
    }

    /// Close the store, leaving its data on disk.
    #[allow(clippy::expect_used)]
    pub fn close(&mut self) {
        self.store
            .take()
            .expect("store is open")
            .close()
            .expect("close store");
    }

    /// Open the store again with `config` applied to this location.
    #[allow(clippy::expect_used)]
    pub fn open_with(&mut self, config: impl FnOnce(StoreConfig) -> StoreConfig) {
        assert!(self.store.is_none(), "close the store before reopening");
        let config = config(StoreConfig::new(self.location()));
        self.store = Some(Store::open_with_config(&config).expect("reopen store"));
    }

    /// Close and reopen the store, keeping its data.
    pub fn reopen(&mut self) {
        self.close();
        self.open_with(|config| config);
    }

    #[allow(clippy::expect_used)]
    pub fn add(&mut self, subject: &str, predicate: &str, object: &str) {
        self.store_mut()
            .add(subject.as_bytes(), predicate.as_bytes(), object.as_bytes())
            .expect("add triple");
    }

    #[allow(clippy::expect_used)]
    pub fn remove(&mut self, subject: &str, predicate: &str, object: &str) {
        self.store_mut()
            .remove(subject.as_bytes(), predicate.as_bytes(), object.as_bytes())
            .expect("remove triple");
    }

    #[allow(clippy::expect_used)]
    pub fn contains(&self, subject: &str, predicate: &str, object: &str) -> bool {
        self.store()
            .contains(subject.as_bytes(), predicate.as_bytes(), object.as_bytes())
            .expect("contains")
    }

    /// Run a query and collect every result.
    #[allow(clippy::expect_used)]
    pub fn query(
        &self,
        subject: Option<&str>,
        predicate: Option<&str>,
        object: Option<&str>,
    ) -> Vec<Triple> {
        let pattern = pattern(subject, predicate, object);
        self.store()
            .query(&pattern)
            .expect("query")
            .collect::<Result<_, _>>()
            .expect("read stream")
    }

    /// Every triple, in subject, predicate, object order.
    pub fn all(&self) -> Vec<Triple> {
        self.query(None, None, None)
    }

    #[allow(clippy::expect_used)]
    pub fn size(&self) -> u64 {
        self.store().size().expect("size")
    }
}

/// Build a pattern from optional string terms.
#[must_use]
pub fn pattern<'a>(
    subject: Option<&'a str>,
    predicate: Option<&'a str>,
    object: Option<&'a str>,
) -> Pattern<'a> {
    Pattern {
        subject: subject.map(str::as_bytes),
        predicate: predicate.map(str::as_bytes),
        object: object.map(str::as_bytes),
    }
}

#[must_use]
pub fn triple(subject: &str, predicate: &str, object: &str) -> Triple {
    Triple::new(subject, predicate, object)
}
