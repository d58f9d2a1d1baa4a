//! # Lawmark Core
//!
//! Core business logic for the Lawmark legal-document annotation backend.
//!
//! This crate owns the rules that give the data its meaning:
//! - dominant-justification scoring ([`scoring`])
//! - the mutation guard that normalises text, purges stale annotations and recomputes scores on
//!   every document write ([`guard`])
//! - the permission-gated review workflow ([`workflow`])
//! - the multi-criterion document search with exact totals ([`search`])
//! - document/annotation services and statistics over the SQLite store
//!
//! **No API concerns**: HTTP servers, caller authentication and wire formats belong in
//! `api-rest` and `api-shared`.

pub mod annotation;
pub mod config;
pub mod constants;
pub mod document;
pub mod error;
pub mod guard;
pub mod labels;
pub mod repositories;
pub mod scoring;
pub mod search;
pub mod statistics;
pub mod store;
pub mod text;
pub mod validation;
pub mod workflow;

pub use annotation::{Annotation, AnnotationChanges, NewAnnotation, Span};
pub use config::{CoreConfig, NpaCatalogue, NpaEntry, PaginationConfig};
pub use constants::DEFAULT_DATABASE_PATH;
pub use document::{Document, DocumentChanges, DocumentId, NewDocument};
pub use error::{CoreError, CoreResult, ErrorKind};
pub use guard::SaveOutcome;
pub use labels::{Capability, DocumentStatus, Justification, LawType, UnknownLabel};
pub use repositories::annotations::AnnotationService;
pub use repositories::documents::DocumentService;
pub use scoring::JustificationPoints;
pub use search::{PageInfo, PageRequest, SearchCriteria, SearchMode, SearchPage, SearchService};
pub use statistics::{DateRangeStatistics, DocumentStatistics, StatisticsService};
pub use workflow::{CapabilitySet, StatusService, StatusWorkflow};

pub use lawmark_types::{DocumentTitle, NonEmptyText, TextError};
pub use lawmark_uuid::AnnotationId;
