//! Local store contract and SQLite implementation.
//!
//! # Responsibility
//! - Map string keys to JSON text blobs.
//! - Offer typed JSON helpers for list-shaped data sets.
//!
//! # Invariants
//! - `set_item` overwrites the previous value for the key in one statement.
//! - A missing key and a key that was removed are indistinguishable.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store key holding the ordered expense list.
pub const EXPENSES_KEY: &str = "expenses";
/// Store key holding the category label list.
pub const CATEGORIES_KEY: &str = "categories";
/// Store key holding the ordered note list.
pub const NOTES_KEY: &str = "notes";
/// Store key holding the persisted auth session.
pub const AUTH_SESSION_KEY: &str = "auth_session";

pub type StoreResult<T> = Result<T, StoreError>;

/// Local store failure.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Serde {
        key: String,
        source: serde_json::Error,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serde { key, source } => {
                write!(f, "invalid JSON stored under `{key}`: {source}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serde { source, .. } => Some(source),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Browser-style local storage contract.
pub trait LocalStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove_item(&self, key: &str) -> StoreResult<()>;
}

impl<T: LocalStore + ?Sized> LocalStore for &T {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        (**self).remove_item(key)
    }
}

/// SQLite-backed local store over the `local_store` table.
#[derive(Clone, Copy)]
pub struct SqliteLocalStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLocalStore<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl LocalStore for SqliteLocalStore<'_> {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO local_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM local_store WHERE key = ?1;", [key])?;
        Ok(())
    }
}

/// Reads and decodes the JSON value under `key`.
///
/// Returns `Ok(None)` when the key has never been written.
pub fn load_json<T, S>(store: &S, key: &str) -> StoreResult<Option<T>>
where
    T: DeserializeOwned,
    S: LocalStore + ?Sized,
{
    match store.get_item(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Serde {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Encodes `value` as JSON and writes it under `key`.
pub fn save_json<T, S>(store: &S, key: &str, value: &T) -> StoreResult<()>
where
    T: Serialize + ?Sized,
    S: LocalStore + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Serde {
        key: key.to_string(),
        source,
    })?;
    store.set_item(key, &raw)
}
