// SQLite-backed key-value storage

use crate::kv::KvBackend;
use eyre::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DB_FILE: &str = "wishstore.db";

/// Key-value table in a SQLite database
pub struct SqliteBackend {
    db_path: PathBuf,
    db: Connection,
}

impl SqliteBackend {
    /// Open or create `wishstore.db` inside `dir`
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).context("Failed to create store directory")?;

        let db_path = dir.join(DB_FILE);
        let db = Connection::open(&db_path).context("Failed to open SQLite database")?;

        let backend = Self { db_path, db };
        backend.create_schema()?;
        Ok(backend)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating key-value schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

impl KvBackend for SqliteBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .db
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get::<_, String>(0))
            .optional()
            .context("Failed to read key from SQLite")?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let tx = self.db.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            rusqlite::params![key, value],
        )
        .context("Failed to write key to SQLite")?;
        tx.commit()?;

        debug!(key, bytes = value.len(), "Wrote key to SQLite");
        Ok(())
    }
}
