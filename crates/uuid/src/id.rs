//! Implementation of [`AnnotationId`].

use crate::{UuidError, UuidResult};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Opaque, randomly generated identifier of an annotation.
///
/// # Construction
/// - [`AnnotationId::new`] allocates a fresh identifier.
/// - [`AnnotationId::parse`] validates an externally supplied identifier.
///
/// Identifiers deliberately do not implement `Ord`: their ordering carries no meaning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnnotationId(Uuid);

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationId {
    /// Generates a new random (v4) identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an identifier in hyphenated or simple form, in either case.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not a UUID in one of those forms.
    /// Braced and URN forms are rejected.
    pub fn parse(input: &str) -> UuidResult<Self> {
        let trimmed = input.trim();
        if !matches!(trimmed.len(), 32 | 36) {
            return Err(UuidError::InvalidInput(format!(
                "annotation id must be a hyphenated or 32-character UUID, got: '{}'",
                input
            )));
        }

        Uuid::parse_str(trimmed).map(Self).map_err(|e| {
            UuidError::InvalidInput(format!("invalid annotation id '{}': {}", input, e))
        })
    }

    /// Returns the underlying `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for AnnotationId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for AnnotationId {
    /// Formats the identifier in its canonical hyphenated lowercase form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for AnnotationId {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnnotationId::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for AnnotationId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for AnnotationId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        AnnotationId::parse(&s).map_err(serde::de::Error::custom)
    }
}
