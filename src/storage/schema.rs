//! Database schema for the SQLite record sink

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per extracted catalog record
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    price_minor INTEGER NOT NULL,
    currency TEXT NOT NULL,
    availability TEXT NOT NULL,
    source_page INTEGER NOT NULL,
    written_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_source_page ON records(source_page);
"#;

/// Creates the schema if it does not exist yet
pub fn initialize_schema(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
