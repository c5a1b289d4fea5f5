//! SQLite Database
//!
//! The on-disk `KeyValueStore`: one `kv_store` table, one row per persisted
//! partition, reached through an r2d2 pool.

use std::path::Path;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};

use super::kv::KeyValueStore;
use crate::utils::error::AppResult;
use crate::utils::paths::database_path;

type Conn = PooledConnection<SqliteConnectionManager>;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Private in-memory database. A single pooled connection, since every
    /// SQLite `:memory:` connection is its own database.
    pub fn new_in_memory() -> AppResult<Self> {
        let pool = Pool::builder()
            .max_size(1)
            .build(SqliteConnectionManager::memory())?;
        Self::with_pool(pool)
    }

    /// Database at the default data directory location
    pub fn new() -> AppResult<Self> {
        Self::open(&database_path()?)
    }

    /// Open or create the database file, creating parent directories
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let pool = Pool::builder()
            .max_size(4)
            .build(SqliteConnectionManager::file(db_path))?;
        let db = Self::with_pool(pool)?;
        tracing::debug!("[Database] opened {}", db_path.display());
        Ok(db)
    }

    fn with_pool(pool: Pool<SqliteConnectionManager>) -> AppResult<Self> {
        let db = Self { pool };
        db.conn()?.execute(SCHEMA, [])?;
        Ok(db)
    }

    fn conn(&self) -> AppResult<Conn> {
        Ok(self.pool.get()?)
    }

    pub fn is_healthy(&self) -> bool {
        self.conn()
            .map(|conn| conn.query_row("SELECT 1", [], |_| Ok(())).is_ok())
            .unwrap_or(false)
    }

    /// Stored keys in lexical order
    pub fn keys(&self) -> AppResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT key FROM kv_store ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let value = self
            .conn()?
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.conn()?.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.conn()?
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("connections", &self.pool.state().connections)
            .finish()
    }
}
