//! SQLite-backed key-value store.
//!
//! # Responsibility
//! - Persist collection blobs in the `kv_entries` table.
//! - Keep multi-key writes atomic through a single transaction.
//!
//! # Invariants
//! - Only connections with the latest migration applied are accepted.
//! - `put` is an upsert; it never leaves two rows for the same key.

use super::{KvError, KvResult, KvStore};
use crate::db::migrations::{latest_version, schema_version};
use crate::db::{open_db, open_db_in_memory};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const KV_TABLE: &str = "kv_entries";

const UPSERT_SQL: &str = "INSERT INTO kv_entries (key, value, updated_at)
    VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
    ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at;";

/// Key-value store persisted in a SQLite database.
pub struct SqliteKvStore {
    conn: Connection,
}

impl SqliteKvStore {
    /// Wraps a connection that already has the key-value schema applied.
    ///
    /// # Errors
    /// - `UninitializedConnection` when `PRAGMA user_version` is not the latest.
    /// - `MissingTable` when the schema version is set but `kv_entries` is absent.
    pub fn try_new(conn: Connection) -> KvResult<Self> {
        let expected_version = latest_version();
        let actual_version = schema_version(&conn)?;
        if actual_version != expected_version {
            return Err(KvError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let has_table: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [KV_TABLE],
            |row| row.get(0),
        )?;
        if !has_table {
            return Err(KvError::MissingTable(KV_TABLE));
        }

        Ok(Self { conn })
    }

    /// Opens (or creates) a database file and wraps it.
    pub fn open(path: impl AsRef<Path>) -> KvResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens a private in-memory database and wraps it.
    pub fn open_in_memory() -> KvResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    /// Borrows the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }
}

impl KvStore for SqliteKvStore {
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&mut self, key: &str, value: &[u8]) -> KvResult<()> {
        self.conn.execute(UPSERT_SQL, params![key, value])?;
        Ok(())
    }

    fn put_all(&mut self, entries: &[(&str, &[u8])]) -> KvResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(UPSERT_SQL)?;
            for (key, value) in entries {
                stmt.execute(params![key, value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteKvStore;
    use crate::kv::KvStore;

    #[test]
    fn upsert_keeps_single_row_per_key() {
        let mut kv = SqliteKvStore::open_in_memory().unwrap();
        kv.put("ideas", b"[]").unwrap();
        kv.put("ideas", b"[{}]").unwrap();

        let rows: i64 = kv
            .connection()
            .query_row("SELECT COUNT(*) FROM kv_entries;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
        assert_eq!(kv.get("ideas").unwrap().as_deref(), Some(&b"[{}]"[..]));
    }

    #[test]
    fn put_all_writes_every_entry() {
        let mut kv = SqliteKvStore::open_in_memory().unwrap();
        kv.put_all(&[("ideas", b"[]".as_slice()), ("tasks", b"[]".as_slice())])
            .unwrap();

        assert!(kv.get("ideas").unwrap().is_some());
        assert!(kv.get("tasks").unwrap().is_some());
        assert!(kv.get("missing").unwrap().is_none());
    }
}
