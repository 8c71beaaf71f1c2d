//! Append-only mutation log for the keyspace engine.
//!
//! Every mutation is appended to a single log file before it is applied in
//! memory. On open, the log is replayed to rebuild the keyspaces.
//!
//! # File Layout
//!
//! ```text
//! +----------+--------------------------------------------------+
//! | 0-7      | magic "TRIPLIDX"                                 |
//! | 8-11     | format_version (4 bytes)                         |
//! | 12-15    | reserved (4 bytes, zero)                         |
//! | 16-N     | log records                                      |
//! +----------+--------------------------------------------------+
//! ```
//!
//! # Log Record Format
//!
//! ```text
//! +----------+--------------------------------------------------+
//! | 0-3      | record_length (4 bytes, includes header+payload) |
//! | 4        | record_type (1 byte)                             |
//! | 5-N      | payload (variable, depends on type)              |
//! | N-N+3    | CRC32 checksum (4 bytes)                         |
//! +----------+--------------------------------------------------+
//! ```
//!
//! Variable-length payload fields are prefixed with their length as a
//! little-endian `u32`.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::engine::keyspace::KeyspaceId;

/// Magic number identifying a keyspace log file.
pub const MAGIC: [u8; 8] = *b"TRIPLIDX";

/// Current log format version.
pub const FORMAT_VERSION: u32 = 1;

/// Size of the file header.
pub const FILE_HEADER_SIZE: usize = 16;

/// `record_length` (4) + `record_type` (1).
const RECORD_HEADER_SIZE: usize = 5;

/// CRC32 checksum size at end of record.
const CHECKSUM_SIZE: usize = 4;

/// Log record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LogRecordType {
    /// A keyspace was created.
    CreateKeyspace = 0x01,
    /// A key was written.
    Put = 0x02,
    /// A key was deleted.
    Delete = 0x03,
}

impl TryFrom<u8> for LogRecordType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::CreateKeyspace),
            0x02 => Ok(Self::Put),
            0x03 => Ok(Self::Delete),
            _ => Err(value),
        }
    }
}

/// Payload of a log record.
#[derive(Debug, PartialEq, Eq)]
pub enum LogRecordPayload {
    /// Create a keyspace with the given id and name.
    CreateKeyspace { id: KeyspaceId, name: String },
    /// Write `value` under `key` in a keyspace.
    Put {
        keyspace: KeyspaceId,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    /// Remove `key` from a keyspace.
    Delete { keyspace: KeyspaceId, key: Vec<u8> },
}

impl LogRecordPayload {
    /// Get the record type for this payload.
    #[must_use]
    pub const fn record_type(&self) -> LogRecordType {
        match self {
            Self::CreateKeyspace { .. } => LogRecordType::CreateKeyspace,
            Self::Put { .. } => LogRecordType::Put,
            Self::Delete { .. } => LogRecordType::Delete,
        }
    }

    /// Calculate the serialized size of this payload.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::len() is not const-stable
    pub fn serialized_size(&self) -> usize {
        match self {
            Self::CreateKeyspace { name, .. } => 4 + 4 + name.len(),
            Self::Put { key, value, .. } => 4 + 4 + key.len() + 4 + value.len(),
            Self::Delete { key, .. } => 4 + 4 + key.len(),
        }
    }

    /// Serialize the payload into `out`.
    fn write_to(&self, out: &mut Vec<u8>) -> Result<(), LogError> {
        match self {
            Self::CreateKeyspace { id, name } => {
                out.extend_from_slice(&id.to_le_bytes());
                write_field(out, name.as_bytes())?;
            }
            Self::Put {
                keyspace,
                key,
                value,
            } => {
                out.extend_from_slice(&keyspace.to_le_bytes());
                write_field(out, key)?;
                write_field(out, value)?;
            }
            Self::Delete { keyspace, key } => {
                out.extend_from_slice(&keyspace.to_le_bytes());
                write_field(out, key)?;
            }
        }
        Ok(())
    }

    /// Deserialize a payload from bytes.
    pub fn from_bytes(record_type: LogRecordType, bytes: &[u8]) -> Result<Self, LogError> {
        let mut reader = FieldReader::new(bytes);
        let payload = match record_type {
            LogRecordType::CreateKeyspace => {
                let id = reader.read_u32()?;
                let name = String::from_utf8(reader.read_field()?.to_vec())
                    .map_err(|_| LogError::InvalidKeyspaceName)?;
                Self::CreateKeyspace { id, name }
            }
            LogRecordType::Put => {
                let keyspace = reader.read_u32()?;
                let key = reader.read_field()?.to_vec();
                let value = reader.read_field()?.to_vec();
                Self::Put {
                    keyspace,
                    key,
                    value,
                }
            }
            LogRecordType::Delete => {
                let keyspace = reader.read_u32()?;
                let key = reader.read_field()?.to_vec();
                Self::Delete { keyspace, key }
            }
        };

        if !reader.is_exhausted() {
            return Err(LogError::CorruptRecord);
        }
        Ok(payload)
    }

    /// Serialize this payload as a complete, checksummed record.
    pub fn to_record_bytes(&self) -> Result<Vec<u8>, LogError> {
        let total_len = RECORD_HEADER_SIZE + self.serialized_size() + CHECKSUM_SIZE;
        let record_len = u32::try_from(total_len).map_err(|_| LogError::RecordTooLarge {
            size: total_len as u64,
        })?;

        let mut bytes = Vec::with_capacity(total_len);
        bytes.extend_from_slice(&record_len.to_le_bytes());
        bytes.push(self.record_type() as u8);
        self.write_to(&mut bytes)?;

        // CRC32 checksum - computed over everything before it
        let checksum = crc32fast::hash(&bytes);
        bytes.extend_from_slice(&checksum.to_le_bytes());

        Ok(bytes)
    }

    /// Deserialize a complete record.
    ///
    /// Returns the payload and the number of bytes consumed.
    pub fn from_record_bytes(bytes: &[u8]) -> Result<(Self, usize), LogError> {
        if bytes.len() < RECORD_HEADER_SIZE + CHECKSUM_SIZE {
            return Err(LogError::Truncated);
        }

        let record_len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;

        if record_len < RECORD_HEADER_SIZE + CHECKSUM_SIZE {
            return Err(LogError::CorruptRecord);
        }
        if record_len > bytes.len() {
            return Err(LogError::Truncated);
        }

        let stored_checksum = u32::from_le_bytes([
            bytes[record_len - 4],
            bytes[record_len - 3],
            bytes[record_len - 2],
            bytes[record_len - 1],
        ]);
        let computed_checksum = crc32fast::hash(&bytes[..record_len - CHECKSUM_SIZE]);
        if stored_checksum != computed_checksum {
            return Err(LogError::ChecksumMismatch {
                expected: stored_checksum,
                actual: computed_checksum,
            });
        }

        let record_type = LogRecordType::try_from(bytes[4]).map_err(LogError::InvalidRecordType)?;
        let payload = Self::from_bytes(
            record_type,
            &bytes[RECORD_HEADER_SIZE..record_len - CHECKSUM_SIZE],
        )?;

        Ok((payload, record_len))
    }
}

fn write_field(out: &mut Vec<u8>, field: &[u8]) -> Result<(), LogError> {
    let len = u32::try_from(field.len()).map_err(|_| LogError::RecordTooLarge {
        size: field.len() as u64,
    })?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(field);
    Ok(())
}

/// Sequential reader over a record payload.
struct FieldReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> FieldReader<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn read_u32(&mut self) -> Result<u32, LogError> {
        let end = self.offset + 4;
        let raw = self
            .bytes
            .get(self.offset..end)
            .ok_or(LogError::CorruptRecord)?;
        self.offset = end;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn read_field(&mut self) -> Result<&'a [u8], LogError> {
        let len = self.read_u32()? as usize;
        let end = self.offset + len;
        let field = self
            .bytes
            .get(self.offset..end)
            .ok_or(LogError::CorruptRecord)?;
        self.offset = end;
        Ok(field)
    }

    const fn is_exhausted(&self) -> bool {
        self.offset == self.bytes.len()
    }
}

/// Records recovered by replaying a log file.
#[derive(Debug, Default)]
pub struct Replay {
    /// Intact records, in log order.
    pub records: Vec<LogRecordPayload>,
    /// Bytes discarded from a torn or corrupt tail.
    pub truncated_bytes: u64,
}

/// An open log file positioned for appending.
pub struct LogFile {
    file: File,
    /// Offset just past the last intact record.
    len: u64,
    record_count: u64,
    sync: bool,
    /// Set when a failed append could not be cut back off the file.
    poisoned: bool,
    /// Make the next append write only this many bytes and then fail.
    #[cfg(test)]
    short_write: Option<usize>,
}

impl LogFile {
    /// Create a fresh log file at `path`, replacing any existing one.
    pub fn create(path: &Path, sync: bool) -> Result<Self, LogError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        file.write_all(&file_header())?;
        file.sync_all()?;

        Ok(Self {
            file,
            len: FILE_HEADER_SIZE as u64,
            record_count: 0,
            sync,
            poisoned: false,
            #[cfg(test)]
            short_write: None,
        })
    }

    /// Open an existing log file and replay its records.
    ///
    /// A torn or corrupt tail is cut off so later appends start from the
    /// last intact record.
    pub fn open(path: &Path, sync: bool) -> Result<(Self, Replay), LogError> {
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        check_file_header(&bytes)?;

        let mut replay = Replay::default();
        let mut offset = FILE_HEADER_SIZE;
        while offset < bytes.len() {
            match LogRecordPayload::from_record_bytes(&bytes[offset..]) {
                Ok((payload, consumed)) => {
                    replay.records.push(payload);
                    offset += consumed;
                }
                Err(e) => {
                    tracing::warn!(
                        "Discarding log tail at offset {}: {} ({} bytes)",
                        offset,
                        e,
                        bytes.len() - offset
                    );
                    replay.truncated_bytes = (bytes.len() - offset) as u64;
                    break;
                }
            }
        }

        let len = offset as u64;
        if replay.truncated_bytes > 0 {
            file.set_len(len)?;
            file.sync_all()?;
        }
        file.seek(SeekFrom::Start(len))?;

        let log = Self {
            file,
            len,
            record_count: replay.records.len() as u64,
            sync,
            poisoned: false,
            #[cfg(test)]
            short_write: None,
        };
        Ok((log, replay))
    }

    /// Append a record to the end of the log.
    ///
    /// A record that fails partway is cut off again before the error is
    /// returned, so the next append lands right after the last intact
    /// record. If that cleanup fails too, every later append is refused.
    ///
    /// Returns the number of bytes written.
    pub fn append(&mut self, payload: &LogRecordPayload) -> Result<u64, LogError> {
        if self.poisoned {
            return Err(LogError::Poisoned);
        }

        let bytes = payload.to_record_bytes()?;
        if let Err(e) = self.write_record(&bytes) {
            if let Err(rollback) = self.discard_partial_record() {
                tracing::error!(
                    "Failed to discard partial log record at offset {}: {}",
                    self.len,
                    rollback
                );
                self.poisoned = true;
            }
            return Err(e);
        }

        let written = bytes.len() as u64;
        self.len += written;
        self.record_count += 1;
        Ok(written)
    }

    fn write_record(&mut self, bytes: &[u8]) -> Result<(), LogError> {
        #[cfg(test)]
        if let Some(limit) = self.short_write.take() {
            self.file.write_all(&bytes[..limit.min(bytes.len())])?;
            return Err(LogError::Io(std::io::Error::other("injected short write")));
        }

        self.file.write_all(bytes)?;
        if self.sync {
            self.file.sync_data()?;
        }
        Ok(())
    }

    /// Cut the file back to the end of the last intact record.
    fn discard_partial_record(&mut self) -> Result<(), LogError> {
        self.file.set_len(self.len)?;
        self.file.seek(SeekFrom::Start(self.len))?;
        Ok(())
    }

    /// Make the next append write `bytes` bytes of its record and then fail.
    #[cfg(test)]
    pub const fn fail_next_append_after(&mut self, bytes: usize) {
        self.short_write = Some(bytes);
    }

    /// Flush the log to disk.
    pub fn sync(&self) -> Result<(), LogError> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Current length of the log file in bytes.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    /// Whether the log holds no records.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.record_count == 0
    }

    /// Number of records in the log.
    #[must_use]
    pub const fn record_count(&self) -> u64 {
        self.record_count
    }
}

fn file_header() -> [u8; FILE_HEADER_SIZE] {
    let mut header = [0u8; FILE_HEADER_SIZE];
    header[..8].copy_from_slice(&MAGIC);
    header[8..12].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
    header
}

fn check_file_header(bytes: &[u8]) -> Result<(), LogError> {
    if bytes.len() < FILE_HEADER_SIZE || bytes[..8] != MAGIC {
        return Err(LogError::InvalidHeader);
    }
    let version = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    if version != FORMAT_VERSION {
        return Err(LogError::UnsupportedVersion(version));
    }
    Ok(())
}

/// Errors that can occur during log operations.
#[derive(Debug)]
pub enum LogError {
    /// I/O error.
    Io(std::io::Error),
    /// File does not start with a valid log header.
    InvalidHeader,
    /// Log was written by an unknown format version.
    UnsupportedVersion(u32),
    /// Record ends past the end of the file.
    Truncated,
    /// Corrupt log record.
    CorruptRecord,
    /// Invalid record type byte.
    InvalidRecordType(u8),
    /// Checksum mismatch.
    ChecksumMismatch { expected: u32, actual: u32 },
    /// Record does not fit the length field.
    RecordTooLarge { size: u64 },
    /// Keyspace name is not valid UTF-8.
    InvalidKeyspaceName,
    /// An earlier failed append left bytes that could not be removed.
    Poisoned,
}

impl std::fmt::Display for LogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "log I/O error: {e}"),
            Self::InvalidHeader => write!(f, "invalid log file header"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported log format version: {v}"),
            Self::Truncated => write!(f, "truncated log record"),
            Self::CorruptRecord => write!(f, "corrupt log record"),
            Self::InvalidRecordType(t) => write!(f, "invalid log record type: 0x{t:02x}"),
            Self::ChecksumMismatch { expected, actual } => {
                write!(
                    f,
                    "log checksum mismatch: expected 0x{expected:08x}, got 0x{actual:08x}"
                )
            }
            Self::RecordTooLarge { size } => {
                write!(f, "log record too large: {size} bytes")
            }
            Self::InvalidKeyspaceName => write!(f, "keyspace name is not valid UTF-8"),
            Self::Poisoned => write!(f, "log is unusable after a failed append"),
        }
    }
}

impl std::error::Error for LogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LogError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
