//! Input validation utilities.
//!
//! This module contains functions for validating user inputs to ensure they meet
//! safety and correctness requirements before being used in operations.

use crate::{CoreError, CoreResult};

/// Validates that an NPA code is a safe, ASCII label identifier.
///
/// NPA codes are compared case-insensitively by the search engine using SQLite's `lower()`,
/// which only folds ASCII, so the catalogue is restricted to:
/// - non-empty strings of at most 50 characters
/// - ASCII alphanumerics, `_` and `-`
///
/// # Errors
///
/// Returns a `CoreError::InvalidInput` if the code is invalid.
pub fn validate_npa_code(code: &str) -> CoreResult<()> {
    const MAX_CODE_LEN: usize = 50;

    if code.trim().is_empty() {
        return Err(CoreError::InvalidInput("NPA code cannot be empty".into()));
    }

    if code.len() > MAX_CODE_LEN {
        return Err(CoreError::InvalidInput(format!(
            "NPA code exceeds maximum length of {} characters",
            MAX_CODE_LEN
        )));
    }

    let ok = code
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'-'));

    if !ok {
        return Err(CoreError::InvalidInput(format!(
            "NPA code '{}' contains invalid characters (only alphanumeric, '_', '-' allowed)",
            code
        )));
    }

    Ok(())
}

/// Validates that a username supplied by the caller can be recorded as a document owner.
pub fn validate_username(username: &str) -> CoreResult<()> {
    const MAX_USERNAME_LEN: usize = 150;

    if username.trim().is_empty() {
        return Err(CoreError::InvalidInput("username cannot be empty".into()));
    }

    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(CoreError::InvalidInput(format!(
            "username exceeds maximum length of {} characters",
            MAX_USERNAME_LEN
        )));
    }

    if username.chars().any(char::is_control) {
        return Err(CoreError::InvalidInput(
            "username must not contain control characters".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_npa_code_accepts_identifiers() {
        assert!(validate_npa_code("NOTSELECTED").is_ok());
        assert!(validate_npa_code("FZ-152_art").is_ok());
    }

    #[test]
    fn test_validate_npa_code_rejects_non_ascii_and_blank() {
        assert!(validate_npa_code("").is_err());
        assert!(validate_npa_code("ФЗ").is_err());
        assert!(validate_npa_code("a b").is_err());
        assert!(validate_npa_code(&"X".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("annotator_1").is_ok());
        assert!(validate_username("Мария").is_ok());
        assert!(validate_username("  ").is_err());
        assert!(validate_username("bad\nname").is_err());
    }
}
