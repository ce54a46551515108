//! SQLite record sink
//!
//! Each `append` runs in one transaction, so an interrupted session leaves
//! only whole batches behind.

use crate::record::{Availability, Price, Record};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ResultSink, SinkError, SinkResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const INSERT_SQL: &str = "INSERT INTO records \
    (name, price_minor, currency, availability, source_page, written_at) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

/// SQLite-backed sink
pub struct SqliteSink {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteSink {
    /// Opens or creates the database at `path`
    pub fn open(path: &Path) -> SinkResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Commits must survive power loss once append returns.
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> SinkResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Counts all stored records
    pub fn count_records(&self) -> SinkResult<u64> {
        let conn = self.conn.lock().map_err(|_| SinkError::Poisoned)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Loads the records scraped from one page, in insertion order
    pub fn records_for_page(&self, page: u32) -> SinkResult<Vec<Record>> {
        let conn = self.conn.lock().map_err(|_| SinkError::Poisoned)?;
        let mut stmt = conn.prepare(
            "SELECT name, price_minor, currency, availability, source_page \
             FROM records WHERE source_page = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![page], |row| {
            let price_minor: i64 = row.get(1)?;
            let availability: String = row.get(3)?;
            Ok(Record {
                name: row.get(0)?,
                price: Price::new(price_minor.max(0) as u64, row.get::<_, String>(2)?),
                availability: Availability::from_db_string(&availability)
                    .unwrap_or(Availability::Unknown),
                source_page: row.get(4)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

impl ResultSink for SqliteSink {
    fn append(&self, records: &[Record]) -> SinkResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.lock().map_err(|_| SinkError::Poisoned)?;
        let written_at = Utc::now().to_rfc3339();

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(INSERT_SQL)?;
            for record in records {
                stmt.execute(params![
                    record.name,
                    record.price.minor_units() as i64,
                    record.price.currency(),
                    record.availability.as_str(),
                    record.source_page,
                    written_at,
                ])?;
            }
        }
        tx.commit()?;

        Ok(records.len())
    }

    fn finish(&self) -> SinkResult<()> {
        let conn = self.conn.lock().map_err(|_| SinkError::Poisoned)?;
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("SQLite database {}", self.path.display())
    }
}
