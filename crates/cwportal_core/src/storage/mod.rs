//! Key-value storage backends.
//!
//! # Responsibility
//! - Define the string key/value contract the article store writes through.
//! - Provide an in-memory backend (session partition, tests) and a
//!   SQLite-backed backend (persistent partition).
//!
//! # Invariants
//! - A single `set_item` is atomic; nothing spans more than one key.
//! - Backends report failures; callers decide whether they are fatal.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure of one key-value operation.
#[derive(Debug)]
pub enum StorageError {
    /// Writing `key` would exceed the backend's byte quota.
    QuotaExceeded {
        key: String,
        required: usize,
        quota: usize,
    },
    /// Backend refused the operation (disabled, blocked or closed).
    Unavailable(String),
    Db(DbError),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuotaExceeded {
                key,
                required,
                quota,
            } => write!(
                f,
                "quota exceeded writing `{key}`: {required} bytes required, quota is {quota}"
            ),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Browser-style string storage addressed by fixed keys.
pub trait KeyValueStorage {
    /// Returns the stored value, or `None` when the key is absent.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    /// Inserts or replaces the value at `key`.
    fn set_item(&mut self, key: &str, value: &str) -> StorageResult<()>;
    /// Removes `key`. Removing an absent key is not an error.
    fn remove_item(&mut self, key: &str) -> StorageResult<()>;
    /// Lists stored keys in ascending order.
    fn keys(&self) -> StorageResult<Vec<String>>;
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Box<T> {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> StorageResult<()> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        (**self).keys()
    }
}
