//! SQLite persistence.
//!
//! Two tables, `documents` and `annotations`, linked by a foreign key with `ON DELETE CASCADE`.
//! Every operation opens its own connection through [`connect`]; writes run inside
//! `BEGIN IMMEDIATE` transactions so a read-modify-write sees the row it is about to replace.
//!
//! The `*_folded` columns hold Unicode-lowercased copies of searchable text. They are written
//! only by the mutation guard, together with the column they mirror.

use crate::annotation::{Annotation, Span};
use crate::config::CoreConfig;
use crate::document::{Document, DocumentId};
use crate::scoring::JustificationPoints;
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use lawmark_uuid::AnnotationId;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::str::FromStr;

const SCHEMA: &str = r#"
    PRAGMA journal_mode=WAL;
    PRAGMA synchronous=NORMAL;

    CREATE TABLE IF NOT EXISTS documents (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      owner TEXT NOT NULL,
      owner_folded TEXT NOT NULL,
      title TEXT NOT NULL,
      title_folded TEXT NOT NULL,
      text TEXT NOT NULL,
      text_folded TEXT NOT NULL,
      created_at_us INTEGER NOT NULL,
      auth_points INTEGER NOT NULL DEFAULT 0 CHECK (auth_points >= 0),
      care_points INTEGER NOT NULL DEFAULT 0 CHECK (care_points >= 0),
      loyal_points INTEGER NOT NULL DEFAULT 0 CHECK (loyal_points >= 0),
      fair_points INTEGER NOT NULL DEFAULT 0 CHECK (fair_points >= 0),
      pur_points INTEGER NOT NULL DEFAULT 0 CHECK (pur_points >= 0),
      non_points INTEGER NOT NULL DEFAULT 0 CHECK (non_points >= 0),
      dominant_justification TEXT NOT NULL,
      law_type TEXT NOT NULL,
      npa TEXT NOT NULL,
      status TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS annotations (
      id TEXT PRIMARY KEY,
      document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
      start_offset INTEGER NOT NULL,
      end_offset INTEGER NOT NULL,
      orig_text TEXT NOT NULL,
      comment TEXT,
      law_type TEXT NOT NULL,
      law_justification TEXT NOT NULL,
      json_data TEXT NOT NULL,
      created_at_us INTEGER NOT NULL,
      CHECK (start_offset >= 0 AND start_offset < end_offset)
    );

    CREATE INDEX IF NOT EXISTS idx_documents_created ON documents(created_at_us DESC, id DESC);
    CREATE INDEX IF NOT EXISTS idx_annotations_document ON annotations(document_id);
"#;

pub(crate) const DOCUMENT_COLUMNS: &str = "id, owner, title, text, created_at_us, \
     auth_points, care_points, loyal_points, fair_points, pur_points, non_points, \
     dominant_justification, law_type, npa, status";

pub(crate) const ANNOTATION_COLUMNS: &str = "id, document_id, start_offset, end_offset, \
     orig_text, comment, law_type, law_justification, json_data, created_at_us";

/// Create the database file and tables if they do not exist yet.
///
/// Run once at startup, before any service is used.
pub fn initialise(cfg: &CoreConfig) -> CoreResult<()> {
    let conn = connect(cfg)?;
    conn.execute_batch(SCHEMA)?;
    tracing::info!("database ready at {}", cfg.database_path().display());
    Ok(())
}

/// Open a connection with foreign keys enforced and the configured busy timeout.
pub(crate) fn connect(cfg: &CoreConfig) -> CoreResult<Connection> {
    let conn = Connection::open(cfg.database_path())?;
    conn.busy_timeout(cfg.busy_timeout())?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub(crate) fn timestamp_to_micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

pub(crate) fn micros_to_timestamp(micros: i64) -> CoreResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_micros(micros).ok_or(CoreError::InvalidTimestamp(micros))
}

fn column_label<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn column_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let micros: i64 = row.get(idx)?;
    micros_to_timestamp(micros)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

/// Maps a row selected with [`DOCUMENT_COLUMNS`].
pub(crate) fn document_from_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        id: row.get(0)?,
        owner: row.get(1)?,
        title: row.get(2)?,
        text: row.get(3)?,
        created_at: column_timestamp(row, 4)?,
        points: JustificationPoints {
            auth: row.get(5)?,
            care: row.get(6)?,
            loyal: row.get(7)?,
            fair: row.get(8)?,
            pur: row.get(9)?,
            non: row.get(10)?,
        },
        dominant_justification: column_label(row, 11)?,
        law_type: column_label(row, 12)?,
        npa: row.get(13)?,
        status: column_label(row, 14)?,
    })
}

/// Maps a row selected with [`ANNOTATION_COLUMNS`].
pub(crate) fn annotation_from_row(row: &Row<'_>) -> rusqlite::Result<Annotation> {
    let start: u32 = row.get(2)?;
    let end: u32 = row.get(3)?;
    let span = Span::new(start, end)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Integer, Box::new(e)))?;
    let json_raw: String = row.get(8)?;
    let json_data = serde_json::from_str(&json_raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;

    Ok(Annotation {
        id: column_label::<AnnotationId>(row, 0)?,
        document_id: row.get(1)?,
        span,
        orig_text: row.get(4)?,
        comment: row.get(5)?,
        law_type: column_label(row, 6)?,
        law_justification: column_label(row, 7)?,
        json_data,
        created_at: column_timestamp(row, 9)?,
    })
}

/// Load one document, failing with `DocumentNotFound` if it does not exist.
pub(crate) fn load_document(conn: &Connection, id: DocumentId) -> CoreResult<Document> {
    conn.query_row(
        &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1"),
        params![id],
        document_from_row,
    )
    .optional()?
    .ok_or(CoreError::DocumentNotFound(id))
}

/// Load one annotation, failing with `AnnotationNotFound` if it does not exist.
pub(crate) fn load_annotation(conn: &Connection, id: AnnotationId) -> CoreResult<Annotation> {
    conn.query_row(
        &format!("SELECT {ANNOTATION_COLUMNS} FROM annotations WHERE id = ?1"),
        params![id.to_string()],
        annotation_from_row,
    )
    .optional()?
    .ok_or(CoreError::AnnotationNotFound(id))
}

/// All annotations of a document, oldest first.
pub(crate) fn load_annotations_for(
    conn: &Connection,
    document_id: DocumentId,
) -> CoreResult<Vec<Annotation>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ANNOTATION_COLUMNS} FROM annotations WHERE document_id = ?1 \
         ORDER BY created_at_us ASC, rowid ASC"
    ))?;
    let rows = stmt.query_map(params![document_id], annotation_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub(crate) fn count_annotations_for(conn: &Connection, document_id: DocumentId) -> CoreResult<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM annotations WHERE document_id = ?1",
        params![document_id],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as u64)
}
