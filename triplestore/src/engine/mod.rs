//! Ordered key-value engine with named keyspaces.
//!
//! The engine keeps every keyspace as an in-memory ordered map and persists
//! mutations to an append-only log in the engine directory:
//!
//! - `keyspaces.log`: file header followed by CRC-framed mutation records
//!
//! Opening an engine replays the log. Closing it flushes the log and, when
//! enough superseded records have piled up, compacts it into a snapshot.
//!
//! # Usage
//!
//! ```ignore
//! use triplestore::engine::{Engine, EngineOptions};
//!
//! let (mut engine, handles) = Engine::open(path, &EngineOptions::default(), &["default", "spo"])?;
//! engine.put(&handles[1], b"key", b"")?;
//!
//! let mut cursor = engine.cursor(&handles[1])?;
//! cursor.seek(b"k");
//! assert_eq!(cursor.key(), Some(b"key".as_slice()));
//! ```

mod keyspace;
mod log;

use std::path::{Path, PathBuf};

pub use keyspace::{Cursor, Keyspace, KeyspaceHandle, KeyspaceId};
pub use log::LogError;
pub(crate) use log::{LogFile, LogRecordPayload};

/// Name of the log file inside the engine directory.
pub const LOG_FILE_NAME: &str = "keyspaces.log";

/// Temporary file used while compacting the log.
const COMPACTION_FILE_NAME: &str = "keyspaces.log.compact";

/// Name of the keyspace that always exists.
pub const DEFAULT_KEYSPACE: &str = "default";

/// Default log size before compaction is considered (4MB).
pub const DEFAULT_COMPACTION_BYTES: u64 = 4 * 1024 * 1024;

/// Options controlling how an engine is opened.
#[derive(Debug, Copy, Clone)]
pub struct EngineOptions {
    /// Create the engine directory if it does not exist.
    pub create_if_missing: bool,
    /// Create requested keyspaces that do not exist yet.
    pub create_missing_keyspaces: bool,
    /// fsync the log after every write.
    pub sync: bool,
    /// Log size in bytes above which `close` compacts.
    /// Set to 0 to disable compaction on close.
    pub compaction_bytes: u64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            create_missing_keyspaces: true,
            sync: false,
            compaction_bytes: DEFAULT_COMPACTION_BYTES,
        }
    }
}

/// Engine properties that can be queried per keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    /// Estimated number of keys in the keyspace.
    EstimateNumKeys,
}

/// Statistics from replaying the log on open.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplayStats {
    /// Number of log records applied.
    pub records_replayed: u64,
    /// Bytes cut from a torn log tail.
    pub truncated_bytes: u64,
}

/// An open engine.
pub struct Engine {
    path: PathBuf,
    log: LogFile,
    keyspaces: Vec<Keyspace>,
    options: EngineOptions,
    open_handles: usize,
    replay_stats: ReplayStats,
    /// Remaining writes before every write fails.
    #[cfg(test)]
    write_budget: Option<u64>,
}

impl Engine {
    /// Open the engine at `path`, returning one handle per name in `names`.
    ///
    /// The `default` keyspace always exists, even when not requested.
    pub fn open(
        path: &Path,
        options: &EngineOptions,
        names: &[&str],
    ) -> Result<(Self, Vec<KeyspaceHandle>), EngineError> {
        if !path.exists() {
            if !options.create_if_missing {
                return Err(EngineError::NotFound(path.to_path_buf()));
            }
            std::fs::create_dir_all(path)?;
        }

        let log_path = path.join(LOG_FILE_NAME);
        let (log, replay) = if log_path.exists() {
            LogFile::open(&log_path, options.sync)?
        } else {
            (LogFile::create(&log_path, options.sync)?, log::Replay::default())
        };

        let mut engine = Self {
            path: path.to_path_buf(),
            log,
            keyspaces: Vec::new(),
            options: *options,
            open_handles: 0,
            replay_stats: ReplayStats {
                records_replayed: replay.records.len() as u64,
                truncated_bytes: replay.truncated_bytes,
            },
            #[cfg(test)]
            write_budget: None,
        };

        for record in replay.records {
            engine.apply(record)?;
        }

        if engine.find_keyspace(DEFAULT_KEYSPACE).is_none() {
            engine.create_keyspace(DEFAULT_KEYSPACE)?;
        }

        let mut handles = Vec::with_capacity(names.len());
        for name in names {
            let id = match engine.find_keyspace(name) {
                Some(keyspace) => keyspace.id(),
                None if options.create_missing_keyspaces => engine.create_keyspace(name)?,
                None => return Err(EngineError::MissingKeyspace((*name).to_string())),
            };
            handles.push(KeyspaceHandle::new(id, (*name).to_string()));
        }
        engine.open_handles = handles.len();

        tracing::info!(
            "Opened engine at {}: {} keyspaces, {} log records replayed, {} bytes truncated",
            engine.path.display(),
            engine.keyspaces.len(),
            engine.replay_stats.records_replayed,
            engine.replay_stats.truncated_bytes
        );

        Ok((engine, handles))
    }

    /// Remove the engine's files at `path`.
    ///
    /// A missing location is not an error. The directory itself is removed
    /// only if nothing else lives in it.
    pub fn destroy(path: &Path) -> Result<(), EngineError> {
        if !path.exists() {
            return Ok(());
        }

        for name in [LOG_FILE_NAME, COMPACTION_FILE_NAME] {
            match std::fs::remove_file(path.join(name)) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(EngineError::Io(e)),
            }
        }

        if let Err(e) = std::fs::remove_dir(path) {
            tracing::debug!(
                "Keeping engine directory {}: {}",
                path.display(),
                e
            );
        }

        tracing::info!("Destroyed engine at {}", path.display());
        Ok(())
    }

    /// The engine directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Statistics from the replay performed by `open`.
    #[must_use]
    pub const fn replay_stats(&self) -> ReplayStats {
        self.replay_stats
    }

    /// Names of all keyspaces, in creation order.
    pub fn keyspace_names(&self) -> impl Iterator<Item = &str> {
        self.keyspaces.iter().map(Keyspace::name)
    }

    /// Write `value` under `key`.
    pub fn put(
        &mut self,
        handle: &KeyspaceHandle,
        key: &[u8],
        value: &[u8],
    ) -> Result<(), EngineError> {
        self.keyspace(handle)?;
        self.write(LogRecordPayload::Put {
            keyspace: handle.id(),
            key: key.to_vec(),
            value: value.to_vec(),
        })
    }

    /// Delete `key`. Deleting an absent key is not an error.
    pub fn delete(&mut self, handle: &KeyspaceHandle, key: &[u8]) -> Result<(), EngineError> {
        self.keyspace(handle)?;
        self.write(LogRecordPayload::Delete {
            keyspace: handle.id(),
            key: key.to_vec(),
        })
    }

    /// Read the value stored under `key`.
    pub fn get(&self, handle: &KeyspaceHandle, key: &[u8]) -> Result<Option<&[u8]>, EngineError> {
        Ok(self.keyspace(handle)?.get(key))
    }

    /// Create an unpositioned cursor over a keyspace.
    pub fn cursor(&self, handle: &KeyspaceHandle) -> Result<Cursor<'_>, EngineError> {
        Ok(self.keyspace(handle)?.cursor())
    }

    /// Query a keyspace property.
    ///
    /// Returns `None` if the property cannot be supplied for this keyspace.
    #[must_use]
    pub fn property(&self, handle: &KeyspaceHandle, property: Property) -> Option<u64> {
        let keyspace = self.keyspace(handle).ok()?;
        match property {
            Property::EstimateNumKeys => u64::try_from(keyspace.len()).ok(),
        }
    }

    /// Give back a handle issued by `open`.
    pub fn release(&mut self, handle: KeyspaceHandle) {
        tracing::debug!("Releasing keyspace handle '{}'", handle.name());
        self.open_handles = self.open_handles.saturating_sub(1);
    }

    /// Flush the log to disk.
    pub fn flush(&self) -> Result<(), EngineError> {
        Ok(self.log.sync()?)
    }

    /// Rewrite the log so it holds only live keyspaces and entries.
    pub fn compact(&mut self) -> Result<(), EngineError> {
        let before = self.log.len();
        let tmp_path = self.path.join(COMPACTION_FILE_NAME);

        let mut snapshot = LogFile::create(&tmp_path, false)?;
        for keyspace in &self.keyspaces {
            snapshot.append(&LogRecordPayload::CreateKeyspace {
                id: keyspace.id(),
                name: keyspace.name().to_string(),
            })?;
            for (key, value) in keyspace.iter() {
                snapshot.append(&LogRecordPayload::Put {
                    keyspace: keyspace.id(),
                    key: key.to_vec(),
                    value: value.to_vec(),
                })?;
            }
        }
        snapshot.sync()?;
        drop(snapshot);

        let log_path = self.path.join(LOG_FILE_NAME);
        std::fs::rename(&tmp_path, &log_path)?;

        let (log, _) = LogFile::open(&log_path, self.options.sync)?;
        self.log = log;

        tracing::info!(
            "Compacted engine log at {}: {} -> {} bytes",
            self.path.display(),
            before,
            self.log.len()
        );
        Ok(())
    }

    /// Close the engine, flushing and compacting the log when worthwhile.
    pub fn close(mut self) -> Result<(), EngineError> {
        if self.open_handles > 0 {
            tracing::warn!(
                "Closing engine at {} with {} keyspace handles still open",
                self.path.display(),
                self.open_handles
            );
        }

        if self.should_compact() {
            self.compact()?;
        } else {
            self.flush()?;
        }

        tracing::info!("Closed engine at {}", self.path.display());
        Ok(())
    }

    /// Whether the log is large and mostly superseded records.
    fn should_compact(&self) -> bool {
        if self.options.compaction_bytes == 0 || self.log.len() < self.options.compaction_bytes {
            return false;
        }
        let live = self
            .keyspaces
            .iter()
            .map(|keyspace| keyspace.len() as u64 + 1)
            .sum::<u64>();
        self.log.record_count() > live.saturating_mul(2)
    }

    /// Make every later write fail after `writes` more successful ones.
    #[cfg(test)]
    pub(crate) const fn fail_writes_after(&mut self, writes: u64) {
        self.write_budget = Some(writes);
    }

    fn write(&mut self, payload: LogRecordPayload) -> Result<(), EngineError> {
        #[cfg(test)]
        if let Some(budget) = self.write_budget.as_mut() {
            if *budget == 0 {
                return Err(EngineError::Io(std::io::Error::other(
                    "injected write failure",
                )));
            }
            *budget -= 1;
        }

        self.log.append(&payload)?;
        self.apply(payload)
    }

    fn create_keyspace(&mut self, name: &str) -> Result<KeyspaceId, EngineError> {
        let id = KeyspaceId::try_from(self.keyspaces.len())
            .map_err(|_| EngineError::Corrupt("too many keyspaces".to_string()))?;
        self.write(LogRecordPayload::CreateKeyspace {
            id,
            name: name.to_string(),
        })?;
        tracing::debug!("Created keyspace '{}' with id {}", name, id);
        Ok(id)
    }

    /// Apply a logged mutation to the in-memory keyspaces.
    fn apply(&mut self, record: LogRecordPayload) -> Result<(), EngineError> {
        match record {
            LogRecordPayload::CreateKeyspace { id, name } => {
                if self.find_keyspace(&name).is_some() {
                    return Err(EngineError::KeyspaceExists(name));
                }
                if id as usize != self.keyspaces.len() {
                    return Err(EngineError::Corrupt(format!(
                        "keyspace '{name}' has id {id}, expected {}",
                        self.keyspaces.len()
                    )));
                }
                self.keyspaces.push(Keyspace::new(id, name));
            }
            LogRecordPayload::Put {
                keyspace,
                key,
                value,
            } => {
                self.keyspace_by_id_mut(keyspace)?.insert(key, value);
            }
            LogRecordPayload::Delete { keyspace, key } => {
                self.keyspace_by_id_mut(keyspace)?.remove(&key);
            }
        }
        Ok(())
    }

    fn find_keyspace(&self, name: &str) -> Option<&Keyspace> {
        self.keyspaces.iter().find(|keyspace| keyspace.name() == name)
    }

    fn keyspace(&self, handle: &KeyspaceHandle) -> Result<&Keyspace, EngineError> {
        self.keyspaces
            .get(handle.id() as usize)
            .filter(|keyspace| keyspace.name() == handle.name())
            .ok_or(EngineError::UnknownKeyspace(handle.id()))
    }

    fn keyspace_by_id_mut(&mut self, id: KeyspaceId) -> Result<&mut Keyspace, EngineError> {
        self.keyspaces
            .get_mut(id as usize)
            .ok_or(EngineError::UnknownKeyspace(id))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("path", &self.path)
            .field("keyspaces", &self.keyspaces.len())
            .field("log_bytes", &self.log.len())
            .finish_non_exhaustive()
    }
}

/// Errors that can occur during engine operations.
#[derive(Debug)]
pub enum EngineError {
    /// I/O error.
    Io(std::io::Error),
    /// Log error.
    Log(LogError),
    /// Engine directory does not exist.
    NotFound(PathBuf),
    /// Requested keyspace does not exist.
    MissingKeyspace(String),
    /// A keyspace with this name already exists.
    KeyspaceExists(String),
    /// Handle or record refers to an unknown keyspace.
    UnknownKeyspace(KeyspaceId),
    /// Persisted state is inconsistent.
    Corrupt(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Log(e) => write!(f, "log error: {e}"),
            Self::NotFound(path) => write!(f, "engine not found at {}", path.display()),
            Self::MissingKeyspace(name) => write!(f, "keyspace '{name}' does not exist"),
            Self::KeyspaceExists(name) => write!(f, "keyspace '{name}' already exists"),
            Self::UnknownKeyspace(id) => write!(f, "unknown keyspace id {id}"),
            Self::Corrupt(msg) => write!(f, "corrupt engine state: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Log(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<LogError> for EngineError {
    fn from(e: LogError) -> Self {
        Self::Log(e)
    }
}
