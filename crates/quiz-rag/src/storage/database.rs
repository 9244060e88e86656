//! SQLite database for persistent collection storage
//!
//! Every collection lives in one file: a `collections` row per collection and
//! a `segments` row per segment, with the embedding stored as little-endian
//! f32 bytes.

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{CollectionHandle, CollectionId, Segment};

/// Current schema version, kept in `PRAGMA user_version`
pub const SCHEMA_VERSION: i64 = 1;

/// A persisted segment with its embedding
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSegment {
    pub segment: Segment,
    pub embedding: Vec<f32>,
}

/// SQLite-based collection store
#[derive(Clone)]
pub struct CollectionDb {
    conn: Arc<Mutex<Connection>>,
}

impl CollectionDb {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Storage(format!("Failed to open in-memory database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "collection store has schema version {}, this build supports up to {}",
                version, SCHEMA_VERSION
            )));
        }

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
            "#,
        )
        .map_err(|e| Error::Storage(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                id TEXT PRIMARY KEY,
                dimensions INTEGER NOT NULL,
                segment_count INTEGER NOT NULL,
                source_name TEXT,
                indexed_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_collections_indexed_at ON collections(indexed_at);

            CREATE TABLE IF NOT EXISTS segments (
                collection_id TEXT NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
                seq INTEGER NOT NULL,
                content TEXT NOT NULL,
                char_start INTEGER NOT NULL,
                char_end INTEGER NOT NULL,
                embedding BLOB NOT NULL,
                PRIMARY KEY (collection_id, seq)
            );
            "#,
        )
        .map_err(|e| Error::Storage(format!("Failed to run migrations: {}", e)))?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        tracing::debug!("Collection store migrations complete");
        Ok(())
    }

    /// Replace a collection's contents in one transaction
    pub fn replace_collection(
        &self,
        handle: &CollectionHandle,
        entries: &[StoredSegment],
    ) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Storage(format!("Failed to begin transaction: {}", e)))?;

        tx.execute(
            "DELETE FROM segments WHERE collection_id = ?1",
            params![handle.id.as_str()],
        )?;
        tx.execute(
            r#"
            INSERT OR REPLACE INTO collections (id, dimensions, segment_count, source_name, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                handle.id.as_str(),
                handle.dimensions as i64,
                handle.segment_count as i64,
                handle.source_name,
                handle.indexed_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO segments (collection_id, seq, content, char_start, char_end, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;

            for entry in entries {
                stmt.execute(params![
                    handle.id.as_str(),
                    entry.segment.index as i64,
                    entry.segment.text,
                    entry.segment.char_start as i64,
                    entry.segment.char_end as i64,
                    encode_embedding(&entry.embedding),
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| Error::Storage(format!("Failed to commit transaction: {}", e)))?;

        Ok(())
    }

    /// Get a collection record
    pub fn get_collection(&self, id: &CollectionId) -> Result<Option<CollectionHandle>> {
        let conn = self.conn.lock();

        let handle = conn
            .query_row(
                "SELECT id, dimensions, segment_count, source_name, indexed_at FROM collections WHERE id = ?1",
                params![id.as_str()],
                row_to_handle,
            )
            .optional()?;

        Ok(handle)
    }

    /// Most recently indexed collection
    pub fn latest_collection(&self) -> Result<Option<CollectionHandle>> {
        let conn = self.conn.lock();

        let handle = conn
            .query_row(
                r#"
                SELECT id, dimensions, segment_count, source_name, indexed_at FROM collections
                ORDER BY indexed_at DESC, rowid DESC
                LIMIT 1
                "#,
                [],
                row_to_handle,
            )
            .optional()?;

        Ok(handle)
    }

    /// Number of stored collections
    pub fn collection_count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM collections", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Load every segment of a collection in document order
    pub fn load_segments(&self, id: &CollectionId) -> Result<Vec<StoredSegment>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            r#"
            SELECT seq, content, char_start, char_end, embedding FROM segments
            WHERE collection_id = ?1
            ORDER BY seq
            "#,
        )?;

        let rows = stmt.query_map(params![id.as_str()], |row| {
            let seq: i64 = row.get(0)?;
            let content: String = row.get(1)?;
            let char_start: i64 = row.get(2)?;
            let char_end: i64 = row.get(3)?;
            let embedding: Vec<u8> = row.get(4)?;
            Ok((
                Segment::new(seq as usize, content, char_start as usize, char_end as usize),
                embedding,
            ))
        })?;

        let mut segments = Vec::new();
        for row in rows {
            let (segment, bytes) = row?;
            segments.push(StoredSegment {
                embedding: decode_embedding(&bytes)?,
                segment,
            });
        }

        Ok(segments)
    }
}

fn row_to_handle(row: &rusqlite::Row) -> rusqlite::Result<CollectionHandle> {
    let id: String = row.get(0)?;
    let dimensions: i64 = row.get(1)?;
    let segment_count: i64 = row.get(2)?;
    let source_name: Option<String> = row.get(3)?;
    let indexed_at: String = row.get(4)?;

    let id = CollectionId::new(id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let indexed_at = DateTime::parse_from_rfc3339(&indexed_at)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(CollectionHandle {
        id,
        dimensions: dimensions as usize,
        segment_count: segment_count as usize,
        source_name,
        indexed_at,
    })
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(Error::Storage(format!(
            "embedding blob of {} bytes is not a whole number of f32 values",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
