//! The mutation guard: the only code path that writes the `documents` table.
//!
//! Every document save, whether a create, an edit, a classifier update or a status change, is a
//! [`PendingDocument`] passed to [`MutationGuard::save`] inside the caller's transaction. The
//! guard:
//!
//! 1. normalises the text;
//! 2. on update, compares it with the stored text and deletes every annotation of the document
//!    when it differs, because annotation spans are offsets into the old text;
//! 3. recomputes the dominant justification from the counters;
//! 4. writes the row.
//!
//! Nothing is visible to other connections until the caller commits, so readers never observe
//! new text alongside the annotations of the old one. A failure at any step drops the
//! transaction and rolls everything back.

use crate::document::{Document, DocumentId};
use crate::labels::{DocumentStatus, LawType};
use crate::scoring::JustificationPoints;
use crate::store::{load_document, timestamp_to_micros};
use crate::text::{fold_case, normalize_text};
use crate::CoreResult;
use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::{params, Transaction};

/// Document state about to be persisted.
///
/// Owner and creation time are only written on insert; an update keeps the stored values.
#[derive(Clone, Debug)]
pub(crate) struct PendingDocument {
    pub(crate) id: Option<DocumentId>,
    pub(crate) owner: String,
    pub(crate) title: String,
    pub(crate) text: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) points: JustificationPoints,
    pub(crate) law_type: LawType,
    pub(crate) npa: String,
    pub(crate) status: DocumentStatus,
}

impl From<Document> for PendingDocument {
    fn from(doc: Document) -> Self {
        Self {
            id: Some(doc.id),
            owner: doc.owner,
            title: doc.title,
            text: doc.text,
            created_at: doc.created_at,
            points: doc.points,
            law_type: doc.law_type,
            npa: doc.npa,
            status: doc.status,
        }
    }
}

/// Result of a guarded save.
#[derive(Clone, Debug, PartialEq)]
pub struct SaveOutcome {
    pub document: Document,
    /// Annotations deleted because the text changed.
    pub annotations_purged: usize,
}

pub(crate) struct MutationGuard;

impl MutationGuard {
    /// Persist `pending` within `tx`, enforcing the document invariants.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::DocumentNotFound` when updating an id that does not exist, and
    /// `CoreError::Storage` for any database failure. The caller must not commit `tx` after an
    /// error.
    pub(crate) fn save(tx: &Transaction<'_>, pending: PendingDocument) -> CoreResult<SaveOutcome> {
        let text = normalize_text(&pending.text);
        let dominant = pending.points.dominant();
        let points = pending.points;

        match pending.id {
            None => {
                // Stored with microsecond precision; keep the returned value identical.
                let created_at = pending.created_at.trunc_subsecs(6);
                tx.execute(
                    r#"
                    INSERT INTO documents (
                      owner, owner_folded, title, title_folded, text, text_folded, created_at_us,
                      auth_points, care_points, loyal_points, fair_points, pur_points, non_points,
                      dominant_justification, law_type, npa, status
                    ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17)
                    "#,
                    params![
                        pending.owner,
                        fold_case(&pending.owner),
                        pending.title,
                        fold_case(&pending.title),
                        text,
                        fold_case(&text),
                        timestamp_to_micros(created_at),
                        points.auth,
                        points.care,
                        points.loyal,
                        points.fair,
                        points.pur,
                        points.non,
                        dominant.as_str(),
                        pending.law_type.as_str(),
                        pending.npa,
                        pending.status.as_str(),
                    ],
                )?;
                let id = tx.last_insert_rowid();

                Ok(SaveOutcome {
                    document: Document {
                        id,
                        owner: pending.owner,
                        title: pending.title,
                        text,
                        created_at,
                        points,
                        dominant_justification: dominant,
                        law_type: pending.law_type,
                        npa: pending.npa,
                        status: pending.status,
                    },
                    annotations_purged: 0,
                })
            }
            Some(id) => {
                let stored = load_document(tx, id)?;

                let annotations_purged = if stored.text != text {
                    tx.execute(
                        "DELETE FROM annotations WHERE document_id = ?1",
                        params![id],
                    )?
                } else {
                    0
                };

                tx.execute(
                    r#"
                    UPDATE documents SET
                      title = ?2, title_folded = ?3, text = ?4, text_folded = ?5,
                      auth_points = ?6, care_points = ?7, loyal_points = ?8,
                      fair_points = ?9, pur_points = ?10, non_points = ?11,
                      dominant_justification = ?12, law_type = ?13, npa = ?14, status = ?15
                    WHERE id = ?1
                    "#,
                    params![
                        id,
                        pending.title,
                        fold_case(&pending.title),
                        text,
                        fold_case(&text),
                        points.auth,
                        points.care,
                        points.loyal,
                        points.fair,
                        points.pur,
                        points.non,
                        dominant.as_str(),
                        pending.law_type.as_str(),
                        pending.npa,
                        pending.status.as_str(),
                    ],
                )?;

                if annotations_purged > 0 {
                    tracing::info!(
                        document_id = id,
                        annotations_purged,
                        "document text changed, annotations invalidated"
                    );
                }

                Ok(SaveOutcome {
                    document: Document {
                        id,
                        owner: stored.owner,
                        title: pending.title,
                        text,
                        created_at: stored.created_at,
                        points,
                        dominant_justification: dominant,
                        law_type: pending.law_type,
                        npa: pending.npa,
                        status: pending.status,
                    },
                    annotations_purged,
                })
            }
        }
    }
}
