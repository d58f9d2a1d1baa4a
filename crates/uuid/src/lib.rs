//! Annotation identifiers.
//!
//! Annotations are identified by random (version 4) UUIDs rather than sequential keys, so an
//! identifier says nothing about when or in which order an annotation was stored. Downstream
//! consumers treat the value as opaque.
//!
//! ## Canonical form
//! Lawmark renders identifiers in the hyphenated lowercase form
//! (`550e8400-e29b-41d4-a716-446655440000`), which is also how they are stored. Parsing accepts
//! the hyphenated or the simple (32 hex characters) form in either case, because annotation
//! front-ends generate ids client-side.

mod id;

pub use id::{AnnotationId, Uuid};

/// Error type for UUID operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for UUID operations.
pub type UuidResult<T> = Result<T, UuidError>;
