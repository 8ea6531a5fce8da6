//! Object naming scheme for snapshots
//!
//! A snapshot object key deterministically encodes the identity tuple
//! (account, database, container, timestamp) so a reader can reconstruct
//! the tuple from the key alone, without fetching content:
//!
//! ```text
//! {account}/{timestamp}/{database}/{container}/
//!     cosmosdb_nosql_backup_{account}_{database}_{container}_{timestamp}.json
//! ```
//!
//! The timestamp is fixed-width `YYYY-MM-DD-HHMM`, so keys under the same
//! account sort lexicographically in time order and a prefix scan over
//! `{account}/{timestamp}/` yields exactly one backup set.
//!
//! `parse` is a left inverse of `object_key`: for every valid tuple,
//! parsing the generated key returns the tuple unchanged. Keys that do not
//! match the layout fail with `MalformedPathError`.

use std::fmt;

use chrono::{NaiveDateTime, Timelike, Utc};
use thiserror::Error;

/// File-name prefix shared by all full-hierarchy snapshot objects.
pub const SNAPSHOT_FILE_PREFIX: &str = "cosmosdb_nosql_backup";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H%M";

/// Result type for naming operations.
pub type NamingResult<T> = Result<T, MalformedPathError>;

/// An object-store key that does not match the snapshot naming scheme.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedPathError {
    #[error("key does not match the snapshot layout: {0}")]
    Layout(String),

    #[error("invalid timestamp segment: {0}")]
    Timestamp(String),

    #[error("file name does not match its path segments: {0}")]
    NameMismatch(String),
}

/// A backup timestamp with minute precision.
///
/// Ordering on the type matches lexicographic ordering of its rendered
/// form, which is what makes prefix scans chronologically groupable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BackupTimestamp(NaiveDateTime);

impl BackupTimestamp {
    /// Current UTC time, truncated to the minute.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now().naive_utc())
    }

    /// Build from a datetime, truncating sub-minute precision.
    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        let truncated = dt
            .with_second(0)
            .and_then(|d| d.with_nanosecond(0))
            .unwrap_or(dt);
        BackupTimestamp(truncated)
    }

    /// Parse a `YYYY-MM-DD-HHMM` string.
    pub fn parse(s: &str) -> NamingResult<Self> {
        // Fixed width: 4+1+2+1+2+1+4
        if s.len() != 15 {
            return Err(MalformedPathError::Timestamp(s.to_string()));
        }
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
            .map(BackupTimestamp)
            .map_err(|_| MalformedPathError::Timestamp(s.to_string()))
    }
}

impl fmt::Display for BackupTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

/// The identity tuple of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotKey {
    pub account: String,
    pub database: String,
    pub container: String,
    pub timestamp: BackupTimestamp,
}

impl SnapshotKey {
    pub fn new(
        account: impl Into<String>,
        database: impl Into<String>,
        container: impl Into<String>,
        timestamp: BackupTimestamp,
    ) -> Self {
        SnapshotKey {
            account: account.into(),
            database: database.into(),
            container: container.into(),
            timestamp,
        }
    }

    /// Full-hierarchy object key. Collision-free for distinct tuples as
    /// long as names contain no `/`, which the document store enforces.
    pub fn object_key(&self) -> String {
        format!(
            "{account}/{ts}/{db}/{container}/{prefix}_{account}_{db}_{container}_{ts}.json",
            account = self.account,
            ts = self.timestamp,
            db = self.database,
            container = self.container,
            prefix = SNAPSHOT_FILE_PREFIX,
        )
    }

    /// Simpler file name used by single-container backups written next to
    /// the invocation rather than into the account/timestamp hierarchy.
    pub fn local_file_name(&self) -> String {
        format!(
            "backup_{db}_{container}_{ts}.json",
            db = self.database,
            container = self.container,
            ts = self.timestamp,
        )
    }

    /// Key prefix shared by every snapshot of one backup set.
    pub fn backup_set_prefix(account: &str, timestamp: BackupTimestamp) -> String {
        format!("{}/{}/", account, timestamp)
    }

    /// Reconstruct a key from a single-container backup file name.
    ///
    /// A local file name carries only the timestamp; account, database,
    /// and container come from the caller and the name must agree with
    /// them. Left inverse of [`local_file_name`](Self::local_file_name)
    /// for the matching identity.
    pub fn parse_local(
        name: &str,
        account: &str,
        database: &str,
        container: &str,
    ) -> NamingResult<Self> {
        let rest = name
            .strip_prefix("backup_")
            .and_then(|r| r.strip_suffix(".json"))
            .ok_or_else(|| MalformedPathError::Layout(name.to_string()))?;

        let expected = format!("{}_{}_", database, container);
        let ts = rest
            .strip_prefix(expected.as_str())
            .ok_or_else(|| MalformedPathError::NameMismatch(name.to_string()))?;

        let timestamp = BackupTimestamp::parse(ts)?;
        Ok(SnapshotKey::new(account, database, container, timestamp))
    }

    /// Reconstruct the identity tuple from an object key.
    ///
    /// Left inverse of [`object_key`](Self::object_key). The file-name
    /// segment must round-trip against the directory segments; a key with
    /// a consistent layout but a lying file name is rejected.
    pub fn parse(key: &str) -> NamingResult<Self> {
        let segments: Vec<&str> = key.split('/').collect();
        let &[account, ts, database, container, _file] = &segments[..] else {
            return Err(MalformedPathError::Layout(key.to_string()));
        };

        if account.is_empty() || database.is_empty() || container.is_empty() {
            return Err(MalformedPathError::Layout(key.to_string()));
        }

        let timestamp = BackupTimestamp::parse(ts)?;
        let parsed = SnapshotKey::new(account, database, container, timestamp);

        if parsed.object_key() != key {
            return Err(MalformedPathError::NameMismatch(key.to_string()));
        }

        Ok(parsed)
    }
}
