//! SQLite database layer

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use super::{Backend, BackendKind, StorageUsage};
use crate::core::{Record, Status};
use crate::error::Result;
use crate::storage::migrations;

/// Embedded document database for application records
pub struct Database {
    conn: Connection,
    schema_version: u32,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("schema_version", &self.schema_version)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open database at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::configure_pragmas(&conn)?;
        let schema_version = migrations::run_migrations(&conn)?;

        Ok(Self {
            conn,
            schema_version,
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let schema_version = migrations::run_migrations(&conn)?;
        Ok(Self {
            conn,
            schema_version,
        })
    }

    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Current schema version after migrations.
    pub const fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// All records in saved order.
    pub fn list_records(&self) -> Result<Vec<Record>> {
        self.query_records("SELECT body FROM applications ORDER BY sort_order, id", [])
    }

    /// Records whose company name equals `company`, ignoring case.
    pub fn find_by_company(&self, company: &str) -> Result<Vec<Record>> {
        self.query_records(
            "SELECT body FROM applications WHERE company_name = ?1 COLLATE NOCASE ORDER BY sort_order",
            [company],
        )
    }

    pub fn find_by_status(&self, status: &Status) -> Result<Vec<Record>> {
        self.query_records(
            "SELECT body FROM applications WHERE status = ?1 ORDER BY sort_order",
            [status.as_str()],
        )
    }

    /// Records applied between `from` and `to`, both inclusive.
    pub fn find_in_date_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Record>> {
        self.query_records(
            "SELECT body FROM applications WHERE date_applied BETWEEN ?1 AND ?2 ORDER BY date_applied DESC, sort_order",
            [from.to_string(), to.to_string()],
        )
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM applications", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Timestamp of the last write, if the store was ever written.
    pub fn last_updated(&self) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM store_meta WHERE key = 'last_updated'",
                [],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Size of the database in bytes, from its page count.
    pub fn file_bytes(&self) -> Result<u64> {
        let pages: i64 = self
            .conn
            .query_row("PRAGMA page_count;", [], |row| row.get(0))?;
        let page_size: i64 = self
            .conn
            .query_row("PRAGMA page_size;", [], |row| row.get(0))?;
        Ok(u64::try_from(pages).unwrap_or(0) * u64::try_from(page_size).unwrap_or(0))
    }

    fn query_records<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<Record>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;
        let mut results = Vec::new();
        for row in rows {
            results.push(serde_json::from_str(&row?)?);
        }
        Ok(results)
    }

    fn insert_with_order(conn: &Connection, record: &Record, order: i64) -> Result<()> {
        let body = serde_json::to_string(record)?;
        conn.execute(
            "INSERT INTO applications
                (record_id, sort_order, company_name, status, date_applied, body, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id,
                order,
                record.company_name,
                record.status.as_str(),
                record.date_applied.to_string(),
                body,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn touch_summary(&self) -> Result<()> {
        self.conn.execute(
            "INSERT INTO store_meta (key, value) VALUES ('last_updated', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn configure_pragmas(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -16000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;",
        )?;
        Ok(())
    }
}

impl Backend for Database {
    fn kind(&self) -> BackendKind {
        BackendKind::Database
    }

    fn load_all(&mut self) -> Result<Vec<Record>> {
        let records = self.list_records()?;
        debug!(count = records.len(), "loaded database records");
        Ok(records)
    }

    /// Replace every row in one transaction. Identifiers are kept as-is.
    fn save_all(&mut self, records: &[Record]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM applications", [])?;
        for (order, record) in records.iter().enumerate() {
            Self::insert_with_order(&tx, record, i64::try_from(order).unwrap_or(i64::MAX))
                .map_err(|err| err.into_write_failure("database"))?;
        }
        tx.execute(
            "INSERT INTO store_meta (key, value) VALUES ('last_updated', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        debug!(count = records.len(), "saved database records");
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.conn.execute("DELETE FROM applications", [])?;
        self.touch_summary()
    }

    fn usage(&mut self) -> Result<Option<StorageUsage>> {
        Ok(Some(StorageUsage {
            records: Some(self.count()?),
            bytes_used: Some(self.file_bytes()?),
            bytes_limit: None,
            last_updated: self.last_updated()?,
        }))
    }
}
