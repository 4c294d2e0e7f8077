//! Durable key-value byte store boundary.
//!
//! # Responsibility
//! - Define the persistence contract the idea store writes through.
//! - Keep SQLite details out of the store and its views.
//!
//! # Invariants
//! - An absent key reads as `None`, never as an error.
//! - `put_all` is all-or-nothing: either every entry lands or none does.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory_kv;
mod sqlite_kv;

pub use memory_kv::MemoryKvStore;
pub use sqlite_kv::SqliteKvStore;

/// Key holding the serialized idea collection.
pub const IDEAS_KEY: &str = "ideas";
/// Key holding the serialized task collection.
pub const TASKS_KEY: &str = "tasks";

pub type KvResult<T> = Result<T, KvError>;

/// Errors raised by key-value store implementations.
#[derive(Debug)]
pub enum KvError {
    Db(DbError),
    /// Connection schema version does not match the migrations this build knows.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingTable(&'static str),
    /// Backend refused the operation for a reason other than SQLite.
    Unavailable(String),
}

impl Display for KvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) if err.is_storage_full() => write!(f, "storage quota exceeded: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingTable(table) => write!(f, "required table `{table}` is missing"),
            Self::Unavailable(message) => write!(f, "key-value store unavailable: {message}"),
        }
    }
}

impl Error for KvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for KvError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for KvError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Synchronous key-value byte store.
///
/// Writes block until the backend acknowledges or fails; there is no
/// write-back buffering.
pub trait KvStore {
    /// Reads the bytes stored under `key`.
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn put(&mut self, key: &str, value: &[u8]) -> KvResult<()>;

    /// Stores every entry atomically.
    fn put_all(&mut self, entries: &[(&str, &[u8])]) -> KvResult<()>;
}

impl<T: KvStore + ?Sized> KvStore for Box<T> {
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, value: &[u8]) -> KvResult<()> {
        (**self).put(key, value)
    }

    fn put_all(&mut self, entries: &[(&str, &[u8])]) -> KvResult<()> {
        (**self).put_all(entries)
    }
}
