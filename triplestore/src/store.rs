//! The triple store.
//!
//! A [`Store`] keeps every triple in three index keyspaces of one engine
//! (`spo`, `pos`, `osp`) and answers pattern queries from whichever index
//! keeps the pattern's bound fields contiguous.
//!
//! # Consistency
//!
//! `add` and `remove` perform three independent engine writes. If one of
//! them fails the earlier ones are not rolled back, and the indexes disagree
//! until the caller retries or removes the triple.

use std::borrow::Borrow;
use std::path::{Path, PathBuf};

use crate::config::{ConfigError, StoreConfig};
use crate::engine::{
    DEFAULT_KEYSPACE, Engine, EngineError, EngineOptions, KeyspaceHandle, Property,
};
use crate::index::{IndexKind, plan_scan};
use crate::stream::{Stream, StreamError};
use crate::types::{Field, Pattern, TermViolation, Triple, check_term};

/// An open triple store.
pub struct Store {
    location: PathBuf,
    engine: Engine,
    default: KeyspaceHandle,
    /// Index handles, in `IndexKind::ALL` order.
    indexes: [KeyspaceHandle; 3],
}

impl Store {
    /// Open the store at `location`.
    ///
    /// With `create_fresh` any existing data at `location` is destroyed
    /// first.
    pub fn open(location: impl AsRef<Path>, create_fresh: bool) -> Result<Self, StoreError> {
        Self::open_with_config(&StoreConfig::new(location).with_create_fresh(create_fresh))
    }

    /// Open the store described by the `TRIPLESTORE_*` environment variables.
    pub fn open_from_env() -> Result<Self, StoreError> {
        Self::open_with_config(&StoreConfig::from_env()?)
    }

    pub fn open_with_config(config: &StoreConfig) -> Result<Self, StoreError> {
        if config.create_fresh {
            tracing::info!(
                "Destroying existing store data at {}",
                config.location.display()
            );
            Engine::destroy(&config.location).map_err(StoreError::Open)?;
        }

        let options = EngineOptions {
            create_if_missing: true,
            create_missing_keyspaces: true,
            sync: config.sync,
            compaction_bytes: config.compaction_bytes,
        };
        let names = [
            DEFAULT_KEYSPACE,
            IndexKind::Spo.keyspace_name(),
            IndexKind::Pos.keyspace_name(),
            IndexKind::Osp.keyspace_name(),
        ];
        let (engine, handles) =
            Engine::open(&config.location, &options, &names).map_err(StoreError::Open)?;

        let Ok([default, spo, pos, osp]) = <[KeyspaceHandle; 4]>::try_from(handles) else {
            return Err(StoreError::Open(EngineError::Corrupt(
                "engine returned the wrong number of keyspace handles".to_string(),
            )));
        };

        let store = Self {
            location: config.location.clone(),
            engine,
            default,
            indexes: [spo, pos, osp],
        };

        tracing::info!(
            "Opened triple store at {} (sync: {}, fresh: {})",
            store.location.display(),
            config.sync,
            config.create_fresh
        );

        Ok(store)
    }

    /// Release the keyspace handles and close the engine.
    pub fn close(self) -> Result<(), StoreError> {
        let Self {
            location,
            mut engine,
            default,
            indexes,
        } = self;

        for handle in indexes {
            engine.release(handle);
        }
        engine.release(default);
        engine.close().map_err(StoreError::Close)?;

        tracing::info!("Closed triple store at {}", location.display());
        Ok(())
    }

    #[must_use]
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Estimated number of triples, read from the `spo` index.
    pub fn size(&self) -> Result<u64, StoreError> {
        self.engine
            .property(self.handle(IndexKind::Spo), Property::EstimateNumKeys)
            .ok_or(StoreError::SizeUnavailable)
    }

    /// Add a triple to all three indexes.
    ///
    /// Adding a triple that is already present is not an error.
    pub fn add(&mut self, subject: &[u8], predicate: &[u8], object: &[u8]) -> Result<(), StoreError> {
        check_terms(subject, predicate, object)?;
        for index in IndexKind::ALL {
            let key = index.encode(subject, predicate, object);
            self.engine
                .put(&self.indexes[index.as_index()], &key, &[])
                .map_err(|source| StoreError::Write { index, source })?;
        }
        Ok(())
    }

    /// Add triples in order, stopping at the first failure.
    ///
    /// Returns the number of triples added.
    pub fn add_all<I>(&mut self, triples: I) -> Result<usize, StoreError>
    where
        I: IntoIterator,
        I::Item: Borrow<Triple>,
    {
        let mut added = 0;
        for triple in triples {
            let triple = triple.borrow();
            self.add(&triple.subject, &triple.predicate, &triple.object)?;
            added += 1;
        }
        Ok(added)
    }

    /// Remove a triple from all three indexes.
    ///
    /// Removing a triple that is not present is not an error.
    pub fn remove(
        &mut self,
        subject: &[u8],
        predicate: &[u8],
        object: &[u8],
    ) -> Result<(), StoreError> {
        check_terms(subject, predicate, object)?;
        for index in IndexKind::ALL {
            let key = index.encode(subject, predicate, object);
            self.engine
                .delete(&self.indexes[index.as_index()], &key)
                .map_err(|source| StoreError::Write { index, source })?;
        }
        Ok(())
    }

    /// Whether the triple is present, probing the `spo` index only.
    pub fn contains(&self, subject: &[u8], predicate: &[u8], object: &[u8]) -> Result<bool, StoreError> {
        check_terms(subject, predicate, object)?;
        let key = IndexKind::Spo.encode(subject, predicate, object);
        self.engine
            .get(self.handle(IndexKind::Spo), &key)
            .map(|value| value.is_some())
            .map_err(StoreError::Read)
    }

    /// Stream every triple matching `pattern`.
    ///
    /// Triples come back in the key order of the index chosen for the
    /// pattern.
    pub fn query(&self, pattern: &Pattern<'_>) -> Result<Stream<'_>, StoreError> {
        for field in Field::ALL {
            if let Some(term) = pattern.get(field) {
                check_term(term).map_err(|reason| StoreError::InvalidTerm { field, reason })?;
            }
        }

        let plan = plan_scan(pattern);
        tracing::debug!("Query: {} using {} index", pattern, plan.index);

        let cursor = self
            .engine
            .cursor(self.handle(plan.index))
            .map_err(StoreError::Read)?;
        Ok(Stream::new(cursor, plan))
    }

    /// Stream every triple in subject, predicate, object order.
    pub fn serialise(&self) -> Result<Stream<'_>, StoreError> {
        self.query(&Pattern::any())
    }

    /// Make every index write fail after `writes` more succeed.
    #[cfg(test)]
    pub(crate) const fn fail_writes_after(&mut self, writes: u64) {
        self.engine.fail_writes_after(writes);
    }

    /// Whether the index holds the record for this triple.
    #[cfg(test)]
    pub(crate) fn index_contains(&self, index: IndexKind, triple: &Triple) -> bool {
        let key = index.encode(&triple.subject, &triple.predicate, &triple.object);
        matches!(self.engine.get(self.handle(index), &key), Ok(Some(_)))
    }

    const fn handle(&self, index: IndexKind) -> &KeyspaceHandle {
        &self.indexes[index.as_index()]
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("location", &self.location)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

fn check_terms(subject: &[u8], predicate: &[u8], object: &[u8]) -> Result<(), StoreError> {
    for (field, term) in Field::ALL.into_iter().zip([subject, predicate, object]) {
        check_term(term).map_err(|reason| StoreError::InvalidTerm { field, reason })?;
    }
    Ok(())
}

/// Errors that can occur during store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Configuration could not be loaded.
    Config(ConfigError),
    /// The engine could not be opened.
    Open(EngineError),
    /// A write to one of the indexes failed. Writes to earlier indexes stand.
    Write {
        index: IndexKind,
        source: EngineError,
    },
    /// A read from the engine failed.
    Read(EngineError),
    /// The engine could not estimate the number of keys.
    SizeUnavailable,
    /// A term cannot be stored in an index key.
    InvalidTerm {
        field: Field,
        reason: TermViolation,
    },
    /// Reading from a result stream failed.
    Stream(StreamError),
    /// The engine failed while closing.
    Close(EngineError),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {e}"),
            Self::Open(e) => write!(f, "failed to open store: {e}"),
            Self::Write { index, source } => {
                write!(f, "write to {index} index failed: {source}")
            }
            Self::Read(e) => write!(f, "read failed: {e}"),
            Self::SizeUnavailable => write!(f, "store size is unavailable"),
            Self::InvalidTerm { field, reason } => write!(f, "invalid {field}: {reason}"),
            Self::Stream(e) => write!(f, "stream error: {e}"),
            Self::Close(e) => write!(f, "failed to close store: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Open(e) | Self::Read(e) | Self::Close(e) | Self::Write { source: e, .. } => {
                Some(e)
            }
            Self::Stream(e) => Some(e),
            Self::SizeUnavailable | Self::InvalidTerm { .. } => None,
        }
    }
}

impl From<ConfigError> for StoreError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<StreamError> for StoreError {
    fn from(e: StreamError) -> Self {
        Self::Stream(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::new_test_store;

    #[test]
    fn test_add_contains_remove() {
        let (_dir, mut store) = new_test_store();

        assert!(!store.contains(b"s", b"p", b"o").unwrap());
        store.add(b"s", b"p", b"o").unwrap();
        assert!(store.contains(b"s", b"p", b"o").unwrap());
        assert_eq!(store.size().unwrap(), 1);

        store.remove(b"s", b"p", b"o").unwrap();
        assert!(!store.contains(b"s", b"p", b"o").unwrap());
        assert_eq!(store.size().unwrap(), 0);
    }

    #[test]
    fn test_add_writes_every_index() {
        let (_dir, mut store) = new_test_store();
        let triple = Triple::new("s", "p", "o");

        store.add_all([&triple]).unwrap();
        for index in IndexKind::ALL {
            assert!(store.index_contains(index, &triple), "missing from {index}");
        }
    }

    #[test]
    fn test_add_twice_keeps_one_copy() {
        let (_dir, mut store) = new_test_store();
        store.add(b"s", b"p", b"o").unwrap();
        store.add(b"s", b"p", b"o").unwrap();
        assert_eq!(store.size().unwrap(), 1);
        assert_eq!(store.serialise().unwrap().count(), 1);
    }

    #[test]
    fn test_add_all_counts_triples() {
        let (_dir, mut store) = new_test_store();
        let triples = vec![
            Triple::new("a", "p", "1"),
            Triple::new("b", "p", "2"),
            Triple::new("c", "p", "3"),
        ];
        assert_eq!(store.add_all(triples).unwrap(), 3);
        assert_eq!(store.size().unwrap(), 3);
    }

    #[test]
    fn test_add_all_stops_at_first_invalid_triple() {
        let (_dir, mut store) = new_test_store();
        let triples = [
            Triple::new("a", "p", "1"),
            Triple::new("b", "p\0", "2"),
            Triple::new("c", "p", "3"),
        ];

        let result = store.add_all(&triples);
        assert!(matches!(
            result,
            Err(StoreError::InvalidTerm {
                field: Field::Predicate,
                ..
            })
        ));
        assert!(store.contains(b"a", b"p", b"1").unwrap());
        assert!(!store.contains(b"c", b"p", b"3").unwrap());
    }

    #[test]
    fn test_invalid_terms_are_rejected() {
        let (_dir, mut store) = new_test_store();

        assert!(matches!(
            store.add(b"s", b"p", b"o\x7f"),
            Err(StoreError::InvalidTerm {
                field: Field::Object,
                reason: TermViolation::ByteOutOfRange { position: 1, byte: 0x7f }
            })
        ));
        assert!(matches!(
            store.contains(b"s\0", b"p", b"o"),
            Err(StoreError::InvalidTerm {
                field: Field::Subject,
                ..
            })
        ));
        assert!(matches!(
            store.query(&Pattern::any().with_predicate(b"\xff")),
            Err(StoreError::InvalidTerm {
                field: Field::Predicate,
                ..
            })
        ));
        assert_eq!(store.size().unwrap(), 0);
    }

    #[test]
    fn test_failed_write_reports_index() {
        let (_dir, mut store) = new_test_store();
        store.fail_writes_after(1);

        let error = store.add(b"s", b"p", b"o").unwrap_err();
        assert!(matches!(
            error,
            StoreError::Write {
                index: IndexKind::Pos,
                ..
            }
        ));
        assert!(error.to_string().starts_with("write to pos index failed"));
    }

    #[test]
    fn test_store_error_source_chain() {
        use std::error::Error;

        let error = StoreError::Read(EngineError::UnknownKeyspace(9));
        assert_eq!(
            error.source().map(ToString::to_string),
            Some("unknown keyspace id 9".to_string())
        );
        assert!(StoreError::SizeUnavailable.source().is_none());
    }
}
