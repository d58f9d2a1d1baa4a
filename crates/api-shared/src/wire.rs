//! JSON wire types.
//!
//! Field names follow the established client contract (`AUTH_points`, `NPA`, `document`,
//! `start`/`end`), which is why several fields are renamed from their core counterparts.
//! Labels arrive as strings and are parsed here, so an unknown label becomes a core
//! validation error rather than a body rejection.

use chrono::{DateTime, Utc};
use lawmark_core::repositories::documents::DocumentExport;
use lawmark_core::search::{parse_list, PageInfo, SearchCriteria, SearchMode, SearchPage};
use lawmark_core::statistics::{CategoryCount, DateRangeStatistics, DocumentStatistics, PointsCount};
use lawmark_core::{
    Annotation, AnnotationChanges, AnnotationId, CoreError, CoreResult, Document, DocumentChanges,
    DocumentId, DocumentStatus, DocumentTitle, Justification, JustificationPoints, LawType,
    NewAnnotation, NewDocument, NpaCatalogue, PageRequest, Span,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn parse_label<T>(raw: Option<String>) -> CoreResult<Option<T>>
where
    T: std::str::FromStr<Err = lawmark_core::UnknownLabel>,
{
    raw.map(|raw| raw.parse::<T>().map_err(CoreError::from))
        .transpose()
}

// ============================================================================
// COMMON
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageRes {
    pub message: String,
}

impl MessageRes {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parses `page` / `page_size` query values.
///
/// A missing page means page 1; a page that is not a positive integer cannot exist. An
/// unparsable page size falls back to the default.
pub fn page_request(page: Option<&str>, page_size: Option<&str>) -> CoreResult<PageRequest> {
    let page = match page.map(str::trim).filter(|p| !p.is_empty()) {
        None => 1,
        Some(raw) => raw.parse::<u32>().map_err(|_| CoreError::InvalidPage(0))?,
    };
    let page_size = page_size.and_then(|raw| raw.trim().parse::<u32>().ok());
    Ok(PageRequest::new(page, page_size))
}

#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number.
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl PageQuery {
    pub fn page_request(&self) -> CoreResult<PageRequest> {
        page_request(self.page.as_deref(), self.page_size.as_deref())
    }
}

// ============================================================================
// DOCUMENTS
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DocumentRes {
    pub id: DocumentId,
    /// Owner of the document.
    pub username: String,
    pub title: String,
    pub text: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "AUTH_points")]
    pub auth_points: u32,
    #[serde(rename = "CARE_points")]
    pub care_points: u32,
    #[serde(rename = "LOYAL_points")]
    pub loyal_points: u32,
    #[serde(rename = "FAIR_points")]
    pub fair_points: u32,
    #[serde(rename = "PUR_points")]
    pub pur_points: u32,
    #[serde(rename = "NON_points")]
    pub non_points: u32,
    #[schema(value_type = String, example = "CARE")]
    pub dominant_justification: Justification,
    #[schema(value_type = String, example = "BAN")]
    pub law_type: LawType,
    #[serde(rename = "NPA")]
    pub npa: String,
    #[schema(value_type = String, example = "UNMARKED")]
    pub status: DocumentStatus,
}

impl From<Document> for DocumentRes {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            username: doc.owner,
            title: doc.title,
            text: doc.text,
            created_at: doc.created_at,
            auth_points: doc.points.auth,
            care_points: doc.points.care,
            loyal_points: doc.points.loyal,
            fair_points: doc.points.fair,
            pur_points: doc.points.pur,
            non_points: doc.points.non,
            dominant_justification: doc.dominant_justification,
            law_type: doc.law_type,
            npa: doc.npa,
            status: doc.status,
        }
    }
}

/// Body of `POST /documents/` and `PUT /documents/{id}/`.
///
/// `status` and `dominant_justification` are not accepted: the first changes only through
/// `/update_status/`, the second is always computed.
#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct CreateDocumentReq {
    pub title: String,
    pub text: String,
    pub law_type: Option<String>,
    #[serde(rename = "NPA")]
    pub npa: Option<String>,
    #[serde(rename = "AUTH_points")]
    pub auth_points: Option<u32>,
    #[serde(rename = "CARE_points")]
    pub care_points: Option<u32>,
    #[serde(rename = "LOYAL_points")]
    pub loyal_points: Option<u32>,
    #[serde(rename = "FAIR_points")]
    pub fair_points: Option<u32>,
    #[serde(rename = "PUR_points")]
    pub pur_points: Option<u32>,
    #[serde(rename = "NON_points")]
    pub non_points: Option<u32>,
}

impl CreateDocumentReq {
    pub fn into_new_document(self) -> CoreResult<NewDocument> {
        let mut new = NewDocument::new(DocumentTitle::new(&self.title)?, self.text);
        new.law_type = parse_label(self.law_type)?.unwrap_or_default();
        new.npa = self.npa;
        new.points = JustificationPoints {
            auth: self.auth_points.unwrap_or(0),
            care: self.care_points.unwrap_or(0),
            loyal: self.loyal_points.unwrap_or(0),
            fair: self.fair_points.unwrap_or(0),
            pur: self.pur_points.unwrap_or(0),
            non: self.non_points.unwrap_or(0),
        };
        Ok(new)
    }

    /// A full update: title and text are replaced, other fields only when given.
    pub fn into_changes(self) -> CoreResult<DocumentChanges> {
        Ok(DocumentChanges {
            title: Some(DocumentTitle::new(&self.title)?),
            text: Some(self.text),
            law_type: parse_label(self.law_type)?,
            npa: self.npa,
            auth_points: self.auth_points,
            care_points: self.care_points,
            loyal_points: self.loyal_points,
            fair_points: self.fair_points,
            pur_points: self.pur_points,
            non_points: self.non_points,
        })
    }
}

/// Body of `PATCH /documents/{id}/`. Absent fields are left unchanged.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct UpdateDocumentReq {
    pub title: Option<String>,
    pub text: Option<String>,
    pub law_type: Option<String>,
    #[serde(rename = "NPA")]
    pub npa: Option<String>,
    #[serde(rename = "AUTH_points")]
    pub auth_points: Option<u32>,
    #[serde(rename = "CARE_points")]
    pub care_points: Option<u32>,
    #[serde(rename = "LOYAL_points")]
    pub loyal_points: Option<u32>,
    #[serde(rename = "FAIR_points")]
    pub fair_points: Option<u32>,
    #[serde(rename = "PUR_points")]
    pub pur_points: Option<u32>,
    #[serde(rename = "NON_points")]
    pub non_points: Option<u32>,
}

impl UpdateDocumentReq {
    pub fn into_changes(self) -> CoreResult<DocumentChanges> {
        Ok(DocumentChanges {
            title: self.title.map(DocumentTitle::new).transpose()?,
            text: self.text,
            law_type: parse_label(self.law_type)?,
            npa: self.npa,
            auth_points: self.auth_points,
            care_points: self.care_points,
            loyal_points: self.loyal_points,
            fair_points: self.fair_points,
            pur_points: self.pur_points,
            non_points: self.non_points,
        })
    }
}

/// A page of documents in the paginated envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DocumentPageRes {
    /// Number of documents matching the request.
    pub count: u64,
    /// Next page number, if any.
    pub next: Option<u32>,
    /// Previous page number, if any.
    pub previous: Option<u32>,
    pub results: Vec<DocumentRes>,
    pub total_documents: u64,
}

impl DocumentPageRes {
    pub fn new(page: SearchPage, info: PageInfo) -> Self {
        Self {
            count: page.total,
            next: info.next(),
            previous: info.previous(),
            results: page.items.into_iter().map(DocumentRes::from).collect(),
            total_documents: page.total,
        }
    }
}

/// The whole filtered set, returned when pagination is disabled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DocumentListRes {
    pub total_documents: u64,
    pub documents: Vec<DocumentRes>,
}

/// Either search response shape.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum SearchRes {
    Paginated(DocumentPageRes),
    Unpaginated(DocumentListRes),
}

impl From<SearchPage> for SearchRes {
    fn from(page: SearchPage) -> Self {
        match page.page {
            Some(info) => SearchRes::Paginated(DocumentPageRes::new(page, info)),
            None => SearchRes::Unpaginated(DocumentListRes {
                total_documents: page.total,
                documents: page.items.into_iter().map(DocumentRes::from).collect(),
            }),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Free-text query.
    pub search: Option<String>,
    /// `title` (default), `text` or `id`.
    pub search_type: Option<String>,
    /// Comma-separated law types.
    pub law_types: Option<String>,
    /// Comma-separated NPA codes.
    pub npa: Option<String>,
    /// Comma-separated justification labels.
    pub dominant_justifications: Option<String>,
    /// Comma-separated statuses.
    pub status: Option<String>,
    /// `YYYY-MM-DD`.
    pub from_date: Option<String>,
    /// `YYYY-MM-DD`, inclusive.
    pub to_date: Option<String>,
    /// Substring of the owner's username.
    pub user: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl SearchQuery {
    pub fn criteria(&self) -> SearchCriteria {
        SearchCriteria {
            query: self.search.clone(),
            mode: SearchMode::from_param(self.search_type.as_deref()),
            law_types: parse_list(self.law_types.as_deref()),
            dominant_justifications: parse_list(self.dominant_justifications.as_deref()),
            npa_values: parse_list(self.npa.as_deref()),
            status_values: parse_list(self.status.as_deref()),
            from_date: self.from_date.clone(),
            to_date: self.to_date.clone(),
            user: self.user.clone(),
        }
    }

    pub fn page_request(&self) -> CoreResult<PageRequest> {
        page_request(self.page.as_deref(), self.page_size.as_deref())
    }
}

// ============================================================================
// CLASSIFIERS
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClassifierRes {
    #[serde(rename = "AUTH_points")]
    pub auth_points: u32,
    #[serde(rename = "CARE_points")]
    pub care_points: u32,
    #[serde(rename = "LOYAL_points")]
    pub loyal_points: u32,
    #[serde(rename = "FAIR_points")]
    pub fair_points: u32,
    #[serde(rename = "PUR_points")]
    pub pur_points: u32,
    #[serde(rename = "NON_points")]
    pub non_points: u32,
    #[schema(value_type = String)]
    pub dominant_justification: Justification,
    #[schema(value_type = String)]
    pub law_type: LawType,
    #[serde(rename = "NPA")]
    pub npa: String,
}

impl From<Document> for ClassifierRes {
    fn from(doc: Document) -> Self {
        Self {
            auth_points: doc.points.auth,
            care_points: doc.points.care,
            loyal_points: doc.points.loyal,
            fair_points: doc.points.fair,
            pur_points: doc.points.pur,
            non_points: doc.points.non,
            dominant_justification: doc.dominant_justification,
            law_type: doc.law_type,
            npa: doc.npa,
        }
    }
}

/// Body of `PATCH /classifiers/{id}/`.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct ClassifierReq {
    #[serde(rename = "AUTH_points")]
    pub auth_points: Option<u32>,
    #[serde(rename = "CARE_points")]
    pub care_points: Option<u32>,
    #[serde(rename = "LOYAL_points")]
    pub loyal_points: Option<u32>,
    #[serde(rename = "FAIR_points")]
    pub fair_points: Option<u32>,
    #[serde(rename = "PUR_points")]
    pub pur_points: Option<u32>,
    #[serde(rename = "NON_points")]
    pub non_points: Option<u32>,
    pub law_type: Option<String>,
    #[serde(rename = "NPA")]
    pub npa: Option<String>,
}

impl ClassifierReq {
    pub fn into_changes(self) -> CoreResult<DocumentChanges> {
        Ok(DocumentChanges {
            law_type: parse_label(self.law_type)?,
            npa: self.npa,
            auth_points: self.auth_points,
            care_points: self.care_points,
            loyal_points: self.loyal_points,
            fair_points: self.fair_points,
            pur_points: self.pur_points,
            non_points: self.non_points,
            ..Default::default()
        })
    }
}

// ============================================================================
// STATUS
// ============================================================================

/// Body of `PATCH /update_status/{document_id}/`.
///
/// `status` is kept as raw JSON so a missing, null or non-string value is reported as an
/// invalid status instead of a body rejection.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct StatusReq {
    #[serde(default)]
    #[schema(value_type = String, example = "MARKED")]
    pub status: Option<Value>,
}

impl StatusReq {
    /// The requested status label.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidStatus` unless `status` is a JSON string.
    pub fn label(&self) -> CoreResult<&str> {
        match &self.status {
            Some(Value::String(label)) => Ok(label.as_str()),
            Some(other) => Err(CoreError::InvalidStatus(other.to_string())),
            None => Err(CoreError::InvalidStatus(String::new())),
        }
    }
}

// ============================================================================
// ANNOTATIONS
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnnotationRes {
    #[schema(value_type = String)]
    pub id: AnnotationId,
    pub document: DocumentId,
    pub start: u32,
    pub end: u32,
    pub orig_text: String,
    pub comment: Option<String>,
    #[schema(value_type = String)]
    pub law_type: LawType,
    #[schema(value_type = String)]
    pub law_justification: Justification,
    #[schema(value_type = Object)]
    pub json_data: Value,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl From<Annotation> for AnnotationRes {
    fn from(a: Annotation) -> Self {
        Self {
            id: a.id,
            document: a.document_id,
            start: a.span.start(),
            end: a.span.end(),
            orig_text: a.orig_text,
            comment: a.comment,
            law_type: a.law_type,
            law_justification: a.law_justification,
            json_data: a.json_data,
            created_at: a.created_at,
        }
    }
}

/// Body of `POST /annotations/`. Any `orig_text` sent by the client is ignored; it is always
/// taken from the document.
#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct CreateAnnotationReq {
    /// Optional client-generated UUID.
    pub id: Option<String>,
    pub document: DocumentId,
    pub start: u32,
    pub end: u32,
    pub comment: Option<String>,
    pub law_type: Option<String>,
    pub law_justification: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub json_data: Option<Value>,
}

impl CreateAnnotationReq {
    pub fn into_new_annotation(self) -> CoreResult<NewAnnotation> {
        Ok(NewAnnotation {
            id: self.id.as_deref().map(AnnotationId::parse).transpose()?,
            document_id: self.document,
            span: Span::new(self.start, self.end)?,
            comment: self.comment,
            law_type: parse_label(self.law_type)?.unwrap_or_default(),
            law_justification: parse_label(self.law_justification)?.unwrap_or_default(),
            json_data: self.json_data.unwrap_or_else(|| json!({})),
        })
    }
}

/// Body of `PATCH /annotations/{id}/`. Absent fields are left unchanged; `"comment": null`
/// clears the comment.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAnnotationReq {
    pub start: Option<u32>,
    pub end: Option<u32>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub comment: Option<Option<String>>,
    pub law_type: Option<String>,
    pub law_justification: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub json_data: Option<Value>,
}

impl UpdateAnnotationReq {
    /// A request may move either end of the span alone; the service merges it with the
    /// stored span when it writes.
    pub fn into_changes(self) -> CoreResult<AnnotationChanges> {
        Ok(AnnotationChanges {
            start: self.start,
            end: self.end,
            comment: self.comment,
            law_type: parse_label(self.law_type)?,
            law_justification: parse_label(self.law_justification)?,
            json_data: self.json_data,
        })
    }
}

#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnnotationListQuery {
    /// Only annotations of this document.
    pub document: Option<DocumentId>,
}

// ============================================================================
// EXPORT
// ============================================================================

/// An annotation in the export view, without its payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExportAnnotationRes {
    #[schema(value_type = String)]
    pub id: AnnotationId,
    pub document: DocumentId,
    pub start: u32,
    pub end: u32,
    pub orig_text: String,
    pub comment: Option<String>,
    #[schema(value_type = String)]
    pub law_type: LawType,
    #[schema(value_type = String)]
    pub law_justification: Justification,
}

impl From<Annotation> for ExportAnnotationRes {
    fn from(a: Annotation) -> Self {
        Self {
            id: a.id,
            document: a.document_id,
            start: a.span.start(),
            end: a.span.end(),
            orig_text: a.orig_text,
            comment: a.comment,
            law_type: a.law_type,
            law_justification: a.law_justification,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExportDocumentRes {
    #[serde(flatten)]
    pub document: DocumentRes,
    pub annotations: Vec<ExportAnnotationRes>,
}

impl From<DocumentExport> for ExportDocumentRes {
    fn from(export: DocumentExport) -> Self {
        Self {
            document: export.document.into(),
            annotations: export.annotations.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// NPA CATALOGUE
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NpaListRes {
    /// `[code, name]` pairs in catalogue order.
    #[schema(value_type = Vec<Vec<String>>)]
    pub npa: Vec<(String, String)>,
}

impl From<&NpaCatalogue> for NpaListRes {
    fn from(catalogue: &NpaCatalogue) -> Self {
        Self {
            npa: catalogue
                .entries()
                .iter()
                .map(|e| (e.code.clone(), e.name.clone()))
                .collect(),
        }
    }
}

// ============================================================================
// STATISTICS
// ============================================================================

/// `{<key>: value, "total": total}`
fn keyed(key: &str, value: Value, total: u64) -> Value {
    let mut entry = Map::new();
    entry.insert(key.to_string(), value);
    entry.insert("total".to_string(), Value::from(total));
    Value::Object(entry)
}

fn keyed_counts(key: &str, counts: Vec<CategoryCount>) -> Vec<Value> {
    counts
        .into_iter()
        .map(|c| keyed(key, Value::from(c.key), c.total))
        .collect()
}

fn keyed_points(key: &str, counts: Vec<PointsCount>) -> Vec<Value> {
    counts
        .into_iter()
        .map(|c| keyed(key, Value::from(c.points), c.total))
        .collect()
}

/// Response of `GET /statistics`.
///
/// Each list entry is an object with the grouped value under the field's key and a `total`,
/// e.g. `{"user__username": "anna", "total": 3}` or `{"AUTH_points": 2, "total": 5}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatisticsRes {
    pub total_documents: u64,
    #[schema(value_type = Vec<Object>)]
    pub user_document_counts: Vec<Value>,
    #[schema(value_type = Vec<Object>)]
    pub justification_counts: Vec<Value>,
    #[schema(value_type = Vec<Object>)]
    pub law_type_counts: Vec<Value>,
    #[schema(value_type = Vec<Object>)]
    pub npa_counts: Vec<Value>,
    #[schema(value_type = Vec<Object>)]
    pub status_counts: Vec<Value>,
    #[schema(value_type = Vec<Object>)]
    pub auth_points_counts: Vec<Value>,
    #[schema(value_type = Vec<Object>)]
    pub care_points_counts: Vec<Value>,
    #[schema(value_type = Vec<Object>)]
    pub loyal_points_counts: Vec<Value>,
    #[schema(value_type = Vec<Object>)]
    pub fair_points_counts: Vec<Value>,
    #[schema(value_type = Vec<Object>)]
    pub pur_points_counts: Vec<Value>,
    #[schema(value_type = Vec<Object>)]
    pub non_points_counts: Vec<Value>,
    #[schema(value_type = Vec<Object>)]
    pub monthly_counts: Vec<Value>,
    /// Justification -> law type -> count.
    #[schema(value_type = Object)]
    pub justification_law_type_counts: BTreeMap<String, BTreeMap<String, u64>>,
}

impl From<DocumentStatistics> for StatisticsRes {
    fn from(s: DocumentStatistics) -> Self {
        Self {
            total_documents: s.total_documents,
            user_document_counts: keyed_counts("user__username", s.user_document_counts),
            justification_counts: keyed_counts("dominant_justification", s.justification_counts),
            law_type_counts: keyed_counts("law_type", s.law_type_counts),
            npa_counts: keyed_counts("NPA", s.npa_counts),
            status_counts: keyed_counts("status", s.status_counts),
            auth_points_counts: keyed_points("AUTH_points", s.auth_points_counts),
            care_points_counts: keyed_points("CARE_points", s.care_points_counts),
            loyal_points_counts: keyed_points("LOYAL_points", s.loyal_points_counts),
            fair_points_counts: keyed_points("FAIR_points", s.fair_points_counts),
            pur_points_counts: keyed_points("PUR_points", s.pur_points_counts),
            non_points_counts: keyed_points("NON_points", s.non_points_counts),
            monthly_counts: s
                .monthly_counts
                .into_iter()
                .map(|m| keyed("month", Value::from(m.month), m.total))
                .collect(),
            justification_law_type_counts: s.justification_law_type_counts,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DateRangeStatisticsRes {
    pub total_documents: u64,
    #[schema(value_type = Vec<Object>)]
    pub user_document_counts: Vec<Value>,
}

impl From<DateRangeStatistics> for DateRangeStatisticsRes {
    fn from(s: DateRangeStatistics) -> Self {
        Self {
            total_documents: s.total_documents,
            user_document_counts: keyed_counts("user__username", s.user_document_counts),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRangeQuery {
    /// `YYYY-MM-DD`, required.
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`, inclusive, required.
    pub end_date: Option<String>,
}

impl DateRangeQuery {
    /// Both bounds, or a validation error naming the missing one.
    pub fn bounds(&self) -> CoreResult<(&str, &str)> {
        let start = self
            .start_date
            .as_deref()
            .ok_or_else(|| CoreError::InvalidInput("start_date is required".into()))?;
        let end = self
            .end_date
            .as_deref()
            .ok_or_else(|| CoreError::InvalidInput("end_date is required".into()))?;
        Ok((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_document() -> Document {
        Document {
            id: 7,
            owner: "anna".into(),
            title: "Закон".into(),
            text: "Статья 1".into(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
            points: JustificationPoints {
                care: 2,
                ..Default::default()
            },
            dominant_justification: Justification::Care,
            law_type: LawType::Ban,
            npa: "FZ".into(),
            status: DocumentStatus::Marked,
        }
    }

    #[test]
    fn test_document_res_uses_client_field_names() {
        let value = serde_json::to_value(DocumentRes::from(sample_document())).unwrap();
        assert_eq!(value["username"], "anna");
        assert_eq!(value["CARE_points"], 2);
        assert_eq!(value["NPA"], "FZ");
        assert_eq!(value["dominant_justification"], "CARE");
        assert_eq!(value["status"], "MARKED");
        assert!(value.get("owner").is_none());
    }

    #[test]
    fn test_create_document_req_parses_labels() {
        let req: CreateDocumentReq = serde_json::from_value(json!({
            "title": "Закон",
            "text": "текст",
            "law_type": "DUTY",
            "NPA": "FZ",
            "LOYAL_points": 4,
            "status": "CHECKED"
        }))
        .unwrap();
        let new = req.into_new_document().expect("conversion should succeed");
        assert_eq!(new.law_type, LawType::Duty);
        assert_eq!(new.npa.as_deref(), Some("FZ"));
        assert_eq!(new.points.loyal, 4);

        let bad: CreateDocumentReq =
            serde_json::from_value(json!({"title": "t", "text": "x", "law_type": "duty"}))
                .unwrap();
        assert!(matches!(
            bad.into_new_document(),
            Err(CoreError::UnknownLabel(_))
        ));
    }

    #[test]
    fn test_status_req_only_accepts_string_labels() {
        let req: StatusReq = serde_json::from_value(json!({"status": "MARKED"})).unwrap();
        assert_eq!(req.label().expect("label should resolve"), "MARKED");

        for body in [json!({}), json!({"status": null}), json!({"status": 5})] {
            let req: StatusReq = serde_json::from_value(body).unwrap();
            assert!(matches!(req.label(), Err(CoreError::InvalidStatus(_))));
        }
    }

    #[test]
    fn test_update_annotation_req_distinguishes_null_comment() {
        let clear: UpdateAnnotationReq = serde_json::from_value(json!({"comment": null})).unwrap();
        assert_eq!(clear.into_changes().unwrap().comment, Some(None));

        let untouched: UpdateAnnotationReq = serde_json::from_value(json!({})).unwrap();
        let changes = untouched.into_changes().unwrap();
        assert_eq!(changes.comment, None);
        assert_eq!((changes.start, changes.end), (None, None));

        let moved: UpdateAnnotationReq = serde_json::from_value(json!({"end": 9})).unwrap();
        let changes = moved.into_changes().unwrap();
        assert_eq!((changes.start, changes.end), (None, Some(9)));
    }

    #[test]
    fn test_page_request_parsing() {
        assert_eq!(page_request(None, None).unwrap(), PageRequest::new(1, None));
        assert_eq!(
            page_request(Some("3"), Some("50")).unwrap(),
            PageRequest::new(3, Some(50))
        );
        assert_eq!(
            page_request(Some("2"), Some("lots")).unwrap(),
            PageRequest::new(2, None)
        );
        assert!(matches!(
            page_request(Some("last"), None),
            Err(CoreError::InvalidPage(_))
        ));
    }

    #[test]
    fn test_search_res_shapes() {
        let paged = SearchRes::from(SearchPage {
            items: vec![sample_document()],
            total: 30,
            page: Some(PageInfo {
                number: 2,
                page_size: 25,
                num_pages: 2,
            }),
        });
        let value = serde_json::to_value(paged).unwrap();
        assert_eq!(value["count"], 30);
        assert_eq!(value["total_documents"], 30);
        assert_eq!(value["previous"], 1);
        assert!(value["next"].is_null());
        assert_eq!(value["results"].as_array().unwrap().len(), 1);

        let whole = SearchRes::from(SearchPage {
            items: vec![],
            total: 0,
            page: None,
        });
        assert_eq!(
            serde_json::to_value(whole).unwrap(),
            json!({"total_documents": 0, "documents": []})
        );
    }

    #[test]
    fn test_npa_list_res_serialises_pairs() {
        let res = NpaListRes::from(&NpaCatalogue::builtin());
        let value = serde_json::to_value(res).unwrap();
        assert_eq!(value["npa"][0], json!(["NOTSELECTED", "Не выбрано"]));
    }

    #[test]
    fn test_export_document_is_flattened() {
        let res = ExportDocumentRes {
            document: sample_document().into(),
            annotations: vec![],
        };
        let value = serde_json::to_value(res).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["annotations"], json!([]));
    }
}
