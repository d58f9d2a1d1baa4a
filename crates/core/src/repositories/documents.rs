//! Document management.
//!
//! Create, read, update and delete for documents, plus the export view that pairs each
//! document with its annotations.
//!
//! ## Pure Data Operations
//!
//! This module contains **only** data operations. Caller authentication and the mapping of
//! errors to HTTP statuses belong in `api-rest` and `api-shared`.

use crate::annotation::Annotation;
use crate::config::CoreConfig;
use crate::constants::DEFAULT_NPA;
use crate::document::{Document, DocumentChanges, DocumentId, NewDocument};
use crate::guard::{MutationGuard, PendingDocument, SaveOutcome};
use crate::labels::DocumentStatus;
use crate::search::{PageRequest, SearchCriteria, SearchPage, SearchService};
use crate::store::{
    connect, document_from_row, load_annotations_for, load_document, DOCUMENT_COLUMNS,
};
use crate::validation::validate_username;
use crate::{CoreError, CoreResult};
use chrono::Utc;
use rusqlite::{params, TransactionBehavior};
use std::sync::Arc;

/// A document together with all of its annotations.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentExport {
    pub document: Document,
    pub annotations: Vec<Annotation>,
}

/// Service for document records.
#[derive(Clone, Debug)]
pub struct DocumentService {
    cfg: Arc<CoreConfig>,
}

impl DocumentService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Creates a document owned by `owner`.
    ///
    /// The text is normalised and the dominant justification computed on the way in. A
    /// document always starts `UNMARKED`.
    ///
    /// # Errors
    ///
    /// - `CoreError::InvalidInput` for a malformed username or an NPA code outside the
    ///   configured catalogue
    /// - `CoreError::Storage` on database failure
    pub fn create(&self, owner: &str, new: NewDocument) -> CoreResult<Document> {
        validate_username(owner)?;
        let npa = new.npa.unwrap_or_else(|| DEFAULT_NPA.to_string());
        self.cfg.npa_catalogue().validate(&npa)?;

        let mut conn = connect(&self.cfg)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = MutationGuard::save(
            &tx,
            PendingDocument {
                id: None,
                owner: owner.to_string(),
                title: new.title.into_inner(),
                text: new.text,
                created_at: Utc::now(),
                points: new.points,
                law_type: new.law_type,
                npa,
                status: DocumentStatus::Unmarked,
            },
        )?;
        tx.commit()?;

        tracing::info!(document_id = outcome.document.id, owner, "document created");
        Ok(outcome.document)
    }

    pub fn get(&self, id: DocumentId) -> CoreResult<Document> {
        let conn = connect(&self.cfg)?;
        load_document(&conn, id)
    }

    /// One page of all documents, newest first.
    pub fn list(&self, page: PageRequest) -> CoreResult<SearchPage> {
        SearchService::new(self.cfg.clone()).search(&SearchCriteria::default(), Some(page))
    }

    /// Applies a partial update.
    ///
    /// When the (normalised) text changes, every annotation of the document is deleted in the
    /// same transaction; [`SaveOutcome::annotations_purged`] reports how many.
    ///
    /// # Errors
    ///
    /// - `CoreError::DocumentNotFound` if no document has `id`
    /// - `CoreError::InvalidInput` for an NPA code outside the catalogue
    /// - `CoreError::Storage` on database failure
    pub fn update(&self, id: DocumentId, changes: DocumentChanges) -> CoreResult<SaveOutcome> {
        if let Some(npa) = &changes.npa {
            self.cfg.npa_catalogue().validate(npa)?;
        }

        let mut conn = connect(&self.cfg)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let stored = load_document(&tx, id)?;
        let mut pending = PendingDocument::from(stored);
        pending.points = changes.apply_points(pending.points);
        if let Some(title) = changes.title {
            pending.title = title.into_inner();
        }
        if let Some(text) = changes.text {
            pending.text = text;
        }
        if let Some(law_type) = changes.law_type {
            pending.law_type = law_type;
        }
        if let Some(npa) = changes.npa {
            pending.npa = npa;
        }

        let outcome = MutationGuard::save(&tx, pending)?;
        tx.commit()?;

        tracing::info!(document_id = id, "document updated");
        Ok(outcome)
    }

    /// Deletes a document and, through the foreign key, all of its annotations.
    pub fn delete(&self, id: DocumentId) -> CoreResult<()> {
        let conn = connect(&self.cfg)?;
        let deleted = conn.execute("DELETE FROM documents WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(CoreError::DocumentNotFound(id));
        }
        tracing::info!(document_id = id, "document deleted");
        Ok(())
    }

    /// Every document with its annotations, newest document first.
    pub fn export_all(&self) -> CoreResult<Vec<DocumentExport>> {
        let mut conn = connect(&self.cfg)?;
        let tx = conn.transaction()?;

        let documents = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY created_at_us DESC, id DESC"
            ))?;
            let rows = stmt.query_map([], document_from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };

        let mut exported = Vec::with_capacity(documents.len());
        for document in documents {
            let annotations = load_annotations_for(&tx, document.id)?;
            exported.push(DocumentExport {
                document,
                annotations,
            });
        }
        tx.commit()?;
        Ok(exported)
    }
}
