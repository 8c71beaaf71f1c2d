//! Store configuration module.
//!
//! A [`StoreConfig`] can be built in code or loaded from environment
//! variables.
//!
//! # Environment Variables
//!
//! - `TRIPLESTORE_LOCATION`: Directory holding the store's data (required)
//! - `TRIPLESTORE_NEW`: Wipe existing data on open (default: `false`)
//! - `TRIPLESTORE_SYNC`: fsync after every write (default: `false`)
//! - `TRIPLESTORE_COMPACTION_BYTES`: Log size before close compacts it
//!   (default: 4MB, `0` disables compaction)
//!
//! Booleans accept `1`/`0`, `true`/`false` and `yes`/`no`.

use std::path::{Path, PathBuf};

use crate::engine::DEFAULT_COMPACTION_BYTES;

const LOCATION_VAR: &str = "TRIPLESTORE_LOCATION";
const NEW_VAR: &str = "TRIPLESTORE_NEW";
const SYNC_VAR: &str = "TRIPLESTORE_SYNC";
const COMPACTION_BYTES_VAR: &str = "TRIPLESTORE_COMPACTION_BYTES";

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory where the store's data lives.
    pub location: PathBuf,
    /// Destroy any existing data at `location` before opening.
    pub create_fresh: bool,
    /// fsync the engine log after every write.
    pub sync: bool,
    /// Log size in bytes above which closing the store compacts the log.
    pub compaction_bytes: u64,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl StoreConfig {
    /// Configuration for `location` with every other setting at its default.
    #[must_use]
    pub fn new(location: impl AsRef<Path>) -> Self {
        Self {
            location: location.as_ref().to_path_buf(),
            create_fresh: false,
            sync: false,
            compaction_bytes: DEFAULT_COMPACTION_BYTES,
        }
    }

    #[must_use]
    pub const fn with_create_fresh(mut self, create_fresh: bool) -> Self {
        self.create_fresh = create_fresh;
        self
    }

    #[must_use]
    pub const fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    #[must_use]
    pub const fn with_compaction_bytes(mut self, compaction_bytes: u64) -> Self {
        self.compaction_bytes = compaction_bytes;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `TRIPLESTORE_LOCATION` is not set or is empty
    /// - a boolean or byte count variable is set to an unparseable value
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let location = lookup(LOCATION_VAR)
            .ok_or_else(|| ConfigError::MissingEnvVar(LOCATION_VAR.to_string()))?;
        if location.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: LOCATION_VAR.to_string(),
                message: "must not be empty".to_string(),
            });
        }

        let mut config = Self::new(location);
        if let Some(value) = lookup(NEW_VAR) {
            config.create_fresh = parse_bool(NEW_VAR, &value)?;
        }
        if let Some(value) = lookup(SYNC_VAR) {
            config.sync = parse_bool(SYNC_VAR, &value)?;
        }
        if let Some(value) = lookup(COMPACTION_BYTES_VAR) {
            config.compaction_bytes =
                value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                    name: COMPACTION_BYTES_VAR.to_string(),
                    message: format!("'{value}' is not a byte count"),
                })?;
        }
        Ok(config)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("'{value}' is not a boolean (use 1/0, true/false or yes/no)"),
        }),
    }
}
