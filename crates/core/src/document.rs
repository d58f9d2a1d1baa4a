//! Document records and write inputs.

use crate::labels::{DocumentStatus, Justification, LawType};
use crate::scoring::JustificationPoints;
use chrono::{DateTime, Utc};
use lawmark_types::DocumentTitle;
use serde::Serialize;

/// Numeric document identifier, stable once assigned.
pub type DocumentId = i64;

/// A stored document.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Document {
    pub id: DocumentId,
    /// Username of the creating user. Never changes after creation.
    pub owner: String,
    pub title: String,
    /// Normalised text; annotation spans index into it.
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub points: JustificationPoints,
    /// Always `points.dominant()` for a stored document.
    pub dominant_justification: Justification,
    pub law_type: LawType,
    pub npa: String,
    pub status: DocumentStatus,
}

/// Input for creating a document.
#[derive(Clone, Debug)]
pub struct NewDocument {
    pub title: DocumentTitle,
    pub text: String,
    pub points: JustificationPoints,
    pub law_type: LawType,
    /// `None` assigns the default NPA code.
    pub npa: Option<String>,
}

impl NewDocument {
    pub fn new(title: DocumentTitle, text: impl Into<String>) -> Self {
        Self {
            title,
            text: text.into(),
            points: JustificationPoints::default(),
            law_type: LawType::default(),
            npa: None,
        }
    }
}

/// A partial update of a document's editable fields. `None` leaves a field unchanged.
///
/// Status is not editable here; it only changes through the review workflow.
#[derive(Clone, Debug, Default)]
pub struct DocumentChanges {
    pub title: Option<DocumentTitle>,
    pub text: Option<String>,
    pub law_type: Option<LawType>,
    pub npa: Option<String>,
    pub auth_points: Option<u32>,
    pub care_points: Option<u32>,
    pub loyal_points: Option<u32>,
    pub fair_points: Option<u32>,
    pub pur_points: Option<u32>,
    pub non_points: Option<u32>,
}

impl DocumentChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.text.is_none()
            && self.law_type.is_none()
            && self.npa.is_none()
            && self.auth_points.is_none()
            && self.care_points.is_none()
            && self.loyal_points.is_none()
            && self.fair_points.is_none()
            && self.pur_points.is_none()
            && self.non_points.is_none()
    }

    /// Applies the counter changes on top of `points`.
    pub fn apply_points(&self, points: JustificationPoints) -> JustificationPoints {
        JustificationPoints {
            auth: self.auth_points.unwrap_or(points.auth),
            care: self.care_points.unwrap_or(points.care),
            loyal: self.loyal_points.unwrap_or(points.loyal),
            fair: self.fair_points.unwrap_or(points.fair),
            pur: self.pur_points.unwrap_or(points.pur),
            non: self.non_points.unwrap_or(points.non),
        }
    }
}
