//! Annotation records, spans and write inputs.

use crate::document::DocumentId;
use crate::labels::{Justification, LawType};
use crate::text::{char_len, char_slice};
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use lawmark_uuid::AnnotationId;
use serde::Serialize;

/// A half-open character range `[start, end)` within a document's text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    start: u32,
    end: u32,
}

impl Span {
    /// # Errors
    ///
    /// Returns `CoreError::InvalidSpan` unless `start < end`.
    pub fn new(start: u32, end: u32) -> CoreResult<Self> {
        if start >= end {
            return Err(CoreError::InvalidSpan {
                start,
                end,
                len: 0,
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Returns the spanned characters of `text`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidSpan` if the span runs past the end of `text`.
    pub fn extract<'a>(&self, text: &'a str) -> CoreResult<&'a str> {
        char_slice(text, self.start as usize, self.end as usize).ok_or(CoreError::InvalidSpan {
            start: self.start,
            end: self.end,
            len: char_len(text),
        })
    }
}

/// A stored annotation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub document_id: DocumentId,
    pub span: Span,
    /// Copy of the spanned text taken when the span was set.
    pub orig_text: String,
    pub comment: Option<String>,
    pub law_type: LawType,
    pub law_justification: Justification,
    /// Client payload, stored and returned unchanged.
    pub json_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an annotation.
#[derive(Clone, Debug)]
pub struct NewAnnotation {
    /// Client-generated id; a fresh one is allocated when absent.
    pub id: Option<AnnotationId>,
    pub document_id: DocumentId,
    pub span: Span,
    pub comment: Option<String>,
    pub law_type: LawType,
    pub law_justification: Justification,
    pub json_data: serde_json::Value,
}

/// A partial update of an annotation. `None` leaves a field unchanged.
///
/// `start` and `end` may be moved independently; the missing one is taken from the stored
/// span. `comment: Some(None)` clears the comment.
#[derive(Clone, Debug, Default)]
pub struct AnnotationChanges {
    pub start: Option<u32>,
    pub end: Option<u32>,
    pub comment: Option<Option<String>>,
    pub law_type: Option<LawType>,
    pub law_justification: Option<Justification>,
    pub json_data: Option<serde_json::Value>,
}

impl AnnotationChanges {
    /// The span after applying `start`/`end` to `current`, or `None` if neither is set.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidSpan` if the merged span is empty or reversed.
    pub fn resolve_span(&self, current: Span) -> CoreResult<Option<Span>> {
        if self.start.is_none() && self.end.is_none() {
            return Ok(None);
        }
        Span::new(
            self.start.unwrap_or(current.start),
            self.end.unwrap_or(current.end),
        )
        .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_requires_start_before_end() {
        assert!(Span::new(2, 5).is_ok());
        assert!(matches!(
            Span::new(5, 5),
            Err(CoreError::InvalidSpan { start: 5, end: 5, .. })
        ));
        assert!(Span::new(6, 5).is_err());
    }

    #[test]
    fn test_changes_move_either_end_of_the_span() {
        let current = Span::new(4, 10).unwrap();

        let untouched = AnnotationChanges::default();
        assert_eq!(untouched.resolve_span(current).unwrap(), None);

        let end_only = AnnotationChanges {
            end: Some(12),
            ..Default::default()
        };
        assert_eq!(
            end_only.resolve_span(current).unwrap(),
            Some(Span::new(4, 12).unwrap())
        );

        let crossed = AnnotationChanges {
            start: Some(10),
            ..Default::default()
        };
        assert!(matches!(
            crossed.resolve_span(current),
            Err(CoreError::InvalidSpan { start: 10, end: 10, .. })
        ));
    }

    #[test]
    fn test_span_extract_checks_document_length() {
        let text = "Запрещается курение";
        let span = Span::new(0, 11).unwrap();
        assert_eq!(span.extract(text).unwrap(), "Запрещается");

        let past_end = Span::new(12, 40).unwrap();
        assert!(matches!(
            past_end.extract(text),
            Err(CoreError::InvalidSpan { len: 19, .. })
        ));
    }
}
