//! Similarity cache schema

/// SQL schema for the similarity cache database
pub const SCHEMA_SQL: &str = r#"
-- One matrix per (dataset kind, similarity method)
CREATE TABLE IF NOT EXISTS similarity_matrices (
    kind TEXT NOT NULL,
    method TEXT NOT NULL,
    size INTEGER NOT NULL,
    fingerprint TEXT NOT NULL,
    matrix BLOB NOT NULL,
    computed_at TEXT NOT NULL,
    PRIMARY KEY (kind, method)
);
"#;

/// Initializes the cache schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
