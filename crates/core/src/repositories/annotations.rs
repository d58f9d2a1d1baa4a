//! Annotation management.
//!
//! An annotation marks a character span of its document's text. The span is checked against
//! the stored text, and `orig_text` copied from it, inside the same immediate transaction that
//! writes the annotation, so an annotation can never point past the end of the text it was
//! validated against.

use crate::annotation::{Annotation, AnnotationChanges, NewAnnotation};
use crate::config::CoreConfig;
use crate::document::DocumentId;
use crate::store::{
    annotation_from_row, connect, load_annotation, load_annotations_for, load_document,
    timestamp_to_micros, ANNOTATION_COLUMNS,
};
use crate::{CoreError, CoreResult};
use chrono::{SubsecRound, Utc};
use lawmark_uuid::AnnotationId;
use rusqlite::{params, OptionalExtension, TransactionBehavior};
use std::sync::Arc;

/// Service for annotation records.
#[derive(Clone, Debug)]
pub struct AnnotationService {
    cfg: Arc<CoreConfig>,
}

impl AnnotationService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Creates an annotation on an existing document.
    ///
    /// Uses the client-supplied id when present and allocates a random one otherwise.
    ///
    /// # Errors
    ///
    /// - `CoreError::DocumentNotFound` if the document does not exist
    /// - `CoreError::InvalidSpan` if the span runs past the end of the document text
    /// - `CoreError::DuplicateAnnotation` if the supplied id is already taken
    /// - `CoreError::Storage` / `CoreError::Serialization` on persistence failure
    pub fn create(&self, new: NewAnnotation) -> CoreResult<Annotation> {
        let mut conn = connect(&self.cfg)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let document = load_document(&tx, new.document_id)?;
        let orig_text = new.span.extract(&document.text)?.to_string();

        let id = new.id.unwrap_or_default();
        let taken = tx
            .query_row(
                "SELECT 1 FROM annotations WHERE id = ?1",
                params![id.to_string()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if taken {
            return Err(CoreError::DuplicateAnnotation(id));
        }

        let annotation = Annotation {
            id,
            document_id: new.document_id,
            span: new.span,
            orig_text,
            comment: new.comment,
            law_type: new.law_type,
            law_justification: new.law_justification,
            json_data: new.json_data,
            created_at: Utc::now().trunc_subsecs(6),
        };

        tx.execute(
            &format!(
                "INSERT INTO annotations ({ANNOTATION_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            params![
                annotation.id.to_string(),
                annotation.document_id,
                annotation.span.start(),
                annotation.span.end(),
                annotation.orig_text,
                annotation.comment,
                annotation.law_type.as_str(),
                annotation.law_justification.as_str(),
                serde_json::to_string(&annotation.json_data)?,
                timestamp_to_micros(annotation.created_at),
            ],
        )?;
        tx.commit()?;

        tracing::info!(
            annotation_id = %annotation.id,
            document_id = annotation.document_id,
            "annotation created"
        );
        Ok(annotation)
    }

    pub fn get(&self, id: AnnotationId) -> CoreResult<Annotation> {
        let conn = connect(&self.cfg)?;
        load_annotation(&conn, id)
    }

    /// All annotations, or those of one document, oldest first.
    pub fn list(&self, document_id: Option<DocumentId>) -> CoreResult<Vec<Annotation>> {
        let conn = connect(&self.cfg)?;
        match document_id {
            Some(document_id) => load_annotations_for(&conn, document_id),
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ANNOTATION_COLUMNS} FROM annotations \
                     ORDER BY created_at_us ASC, rowid ASC"
                ))?;
                let rows = stmt.query_map([], annotation_from_row)?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            }
        }
    }

    /// The raw `json_data` payloads of a document's annotations, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::DocumentNotFound` if the document does not exist.
    pub fn payloads(&self, document_id: DocumentId) -> CoreResult<Vec<serde_json::Value>> {
        let mut conn = connect(&self.cfg)?;
        let tx = conn.transaction()?;
        load_document(&tx, document_id)?;
        let payloads = load_annotations_for(&tx, document_id)?
            .into_iter()
            .map(|a| a.json_data)
            .collect();
        tx.commit()?;
        Ok(payloads)
    }

    /// Applies a partial update.
    ///
    /// A moved `start` or `end` is merged with the stored span inside the write transaction.
    /// The resulting span is validated against the current document text and `orig_text` is
    /// taken again from it.
    pub fn update(&self, id: AnnotationId, changes: AnnotationChanges) -> CoreResult<Annotation> {
        let mut conn = connect(&self.cfg)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut annotation = load_annotation(&tx, id)?;
        if let Some(span) = changes.resolve_span(annotation.span)? {
            let document = load_document(&tx, annotation.document_id)?;
            annotation.orig_text = span.extract(&document.text)?.to_string();
            annotation.span = span;
        }
        if let Some(comment) = changes.comment {
            annotation.comment = comment;
        }
        if let Some(law_type) = changes.law_type {
            annotation.law_type = law_type;
        }
        if let Some(law_justification) = changes.law_justification {
            annotation.law_justification = law_justification;
        }
        if let Some(json_data) = changes.json_data {
            annotation.json_data = json_data;
        }

        tx.execute(
            r#"
            UPDATE annotations SET
              start_offset = ?2, end_offset = ?3, orig_text = ?4, comment = ?5,
              law_type = ?6, law_justification = ?7, json_data = ?8
            WHERE id = ?1
            "#,
            params![
                annotation.id.to_string(),
                annotation.span.start(),
                annotation.span.end(),
                annotation.orig_text,
                annotation.comment,
                annotation.law_type.as_str(),
                annotation.law_justification.as_str(),
                serde_json::to_string(&annotation.json_data)?,
            ],
        )?;
        tx.commit()?;

        tracing::info!(annotation_id = %id, "annotation updated");
        Ok(annotation)
    }

    pub fn delete(&self, id: AnnotationId) -> CoreResult<()> {
        let conn = connect(&self.cfg)?;
        let deleted = conn.execute(
            "DELETE FROM annotations WHERE id = ?1",
            params![id.to_string()],
        )?;
        if deleted == 0 {
            return Err(CoreError::AnnotationNotFound(id));
        }
        tracing::info!(annotation_id = %id, "annotation deleted");
        Ok(())
    }
}
