//! SQLite cache of similarity matrices
//!
//! Computing a matrix is O(n²) over the collection, so each one is stored as
//! a little-endian `f64` blob keyed by dataset kind and similarity method.

use crate::dataset::DatasetKind;
use crate::dedup::{SimilarityMatrix, SimilarityMethod};
use crate::store::schema::initialize_schema;
use crate::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// A matrix read back from the cache
#[derive(Debug, Clone)]
pub struct CachedMatrix {
    pub matrix: SimilarityMatrix,

    /// Fingerprint of the collection the matrix was computed over
    pub fingerprint: String,

    pub computed_at: DateTime<Utc>,
}

/// SQLite-backed similarity matrix cache
pub struct SimilarityCache {
    conn: Connection,
}

impl SimilarityCache {
    /// Opens or creates the cache database at `path`
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory cache
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn load(
        &self,
        kind: DatasetKind,
        method: SimilarityMethod,
    ) -> StoreResult<Option<CachedMatrix>> {
        let row = self
            .conn
            .query_row(
                "SELECT size, fingerprint, matrix, computed_at FROM similarity_matrices
                 WHERE kind = ?1 AND method = ?2",
                params![kind.tag(), method.name()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((size, fingerprint, blob, computed_at)) = row else {
            return Ok(None);
        };

        let size = usize::try_from(size)
            .map_err(|_| StoreError::Corrupt(format!("negative matrix size {}", size)))?;
        let matrix = SimilarityMatrix::from_le_bytes(size, &blob).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "{}/{}: blob of {} bytes does not hold a {}x{} matrix",
                kind,
                method.name(),
                blob.len(),
                size,
                size
            ))
        })?;
        let computed_at = DateTime::parse_from_rfc3339(&computed_at)
            .map_err(|e| StoreError::Corrupt(format!("bad timestamp '{}': {}", computed_at, e)))?
            .with_timezone(&Utc);

        Ok(Some(CachedMatrix {
            matrix,
            fingerprint,
            computed_at,
        }))
    }

    /// Stores `matrix`, replacing any previous entry for the same key
    pub fn store(
        &self,
        kind: DatasetKind,
        method: SimilarityMethod,
        fingerprint: &str,
        matrix: &SimilarityMatrix,
    ) -> StoreResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO similarity_matrices
                (kind, method, size, fingerprint, matrix, computed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                kind.tag(),
                method.name(),
                matrix.size() as i64,
                fingerprint,
                matrix.to_le_bytes(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}
