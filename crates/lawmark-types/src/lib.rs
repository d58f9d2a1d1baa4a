//! Validated text newtypes shared across the Lawmark crates.
//!
//! Constructors trim their input, so a value that exists is always in its stored form.

/// Maximum length of a document title, in characters.
pub const MAX_TITLE_CHARS: usize = 255;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,

    /// The input text exceeded the permitted number of characters
    #[error("Text exceeds maximum length of {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `Err(TextError::Empty)` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

/// A document title: non-empty and at most [`MAX_TITLE_CHARS`] characters once trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentTitle(NonEmptyText);

impl DocumentTitle {
    /// Creates a new title, trimming the input.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] for blank input and [`TextError::TooLong`] when the trimmed
    /// title has more than [`MAX_TITLE_CHARS`] characters.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let text = NonEmptyText::new(input)?;
        let actual = text.as_str().chars().count();
        if actual > MAX_TITLE_CHARS {
            return Err(TextError::TooLong {
                max: MAX_TITLE_CHARS,
                actual,
            });
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn into_inner(self) -> String {
        self.0.into_inner()
    }
}

impl std::fmt::Display for DocumentTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl AsRef<str> for DocumentTitle {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl serde::Serialize for DocumentTitle {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serde::Serialize::serialize(&self.0, serializer)
    }
}

impl<'de> serde::Deserialize<'de> for DocumentTitle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        DocumentTitle::new(&s).map_err(serde::de::Error::custom)
    }
}
