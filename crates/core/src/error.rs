use crate::document::DocumentId;
use crate::labels::{Capability, DocumentStatus, UnknownLabel};
use lawmark_uuid::AnnotationId;

/// Coarse classification of a [`CoreError`], used by API layers to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller can fix the request and retry.
    Validation,
    /// The caller lacks a required capability.
    Forbidden,
    /// The addressed document, annotation or page does not exist.
    NotFound,
    /// Persistence or infrastructure failure; nothing was applied.
    Storage,
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid status: {0}")]
    InvalidStatus(String),
    #[error("no status transition is defined from {from} to {to}")]
    UndefinedTransition {
        from: DocumentStatus,
        to: DocumentStatus,
    },
    #[error("capability '{required}' is required to set status {requested}")]
    Forbidden {
        required: Capability,
        requested: DocumentStatus,
    },
    #[error("document {0} not found")]
    DocumentNotFound(DocumentId),
    #[error("annotation {0} not found")]
    AnnotationNotFound(AnnotationId),
    #[error("annotation {0} already exists")]
    DuplicateAnnotation(AnnotationId),
    #[error("invalid page: {0}")]
    InvalidPage(u32),
    #[error("invalid span [{start}, {end}) for a text of {len} characters")]
    InvalidSpan { start: u32, end: u32, len: usize },
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error(transparent)]
    UnknownLabel(#[from] UnknownLabel),
    #[error("invalid text: {0}")]
    Text(#[from] lawmark_types::TextError),
    #[error("invalid identifier: {0}")]
    Uuid(#[from] lawmark_uuid::UuidError),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("failed to serialize annotation payload: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("failed to read NPA catalogue: {0}")]
    CatalogueRead(std::io::Error),
    #[error("failed to parse NPA catalogue: {0}")]
    CatalogueParse(serde_yaml::Error),
    #[error("stored timestamp {0} is out of range")]
    InvalidTimestamp(i64),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidInput(_)
            | CoreError::InvalidStatus(_)
            | CoreError::UndefinedTransition { .. }
            | CoreError::DuplicateAnnotation(_)
            | CoreError::InvalidSpan { .. }
            | CoreError::InvalidDate(_)
            | CoreError::UnknownLabel(_)
            | CoreError::Text(_)
            | CoreError::Uuid(_) => ErrorKind::Validation,
            CoreError::Forbidden { .. } => ErrorKind::Forbidden,
            CoreError::DocumentNotFound(_)
            | CoreError::AnnotationNotFound(_)
            | CoreError::InvalidPage(_) => ErrorKind::NotFound,
            CoreError::Storage(_)
            | CoreError::Serialization(_)
            | CoreError::CatalogueRead(_)
            | CoreError::CatalogueParse(_)
            | CoreError::InvalidTimestamp(_) => ErrorKind::Storage,
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
