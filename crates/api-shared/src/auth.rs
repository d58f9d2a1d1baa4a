//! Caller identification.
//!
//! Lawmark does not issue tokens. It sits behind a gateway that authenticates users and
//! forwards who they are in request headers:
//!
//! - `x-api-key`: shared secret proving the request came through the gateway, checked only
//!   when an API key is configured
//! - `x-username`: the authenticated user
//! - `x-capabilities`: comma-separated capability names granted to that user
//!
//! The functions here take raw header values so every API surface can use them.

use lawmark_core::validation::validate_username;
use lawmark_core::CapabilitySet;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const USERNAME_HEADER: &str = "x-username";
pub const CAPABILITIES_HEADER: &str = "x-capabilities";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("Authentication credentials were not provided.")]
    MissingUsername,
    #[error("Invalid username")]
    InvalidUsername,
}

/// Validates the provided API key against the configured one.
///
/// With no key configured every request passes.
pub fn validate_api_key(expected: Option<&str>, provided: Option<&str>) -> Result<(), AuthError> {
    match expected {
        None => Ok(()),
        Some(expected) if provided == Some(expected) => Ok(()),
        Some(_) => Err(AuthError::InvalidApiKey),
    }
}

/// The user on whose behalf a request is made.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Caller {
    username: Option<String>,
    capabilities: CapabilitySet,
}

impl Caller {
    /// Builds a caller from the forwarded header values. Blank values count as absent and
    /// unknown capability names are ignored.
    pub fn from_headers(username: Option<&str>, capabilities: Option<&str>) -> Self {
        let username = username
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        let capabilities = capabilities
            .map(|raw| CapabilitySet::from_names(raw.split(',')))
            .unwrap_or_default();

        Self {
            username,
            capabilities,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// The username, for operations that write.
    pub fn require_username(&self) -> Result<&str, AuthError> {
        let username = self.username().ok_or(AuthError::MissingUsername)?;
        validate_username(username).map_err(|_| AuthError::InvalidUsername)?;
        Ok(username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lawmark_core::Capability;

    #[test]
    fn test_validate_api_key() {
        assert_eq!(validate_api_key(None, None), Ok(()));
        assert_eq!(validate_api_key(None, Some("anything")), Ok(()));
        assert_eq!(validate_api_key(Some("secret"), Some("secret")), Ok(()));
        assert_eq!(
            validate_api_key(Some("secret"), Some("guess")),
            Err(AuthError::InvalidApiKey)
        );
        assert_eq!(
            validate_api_key(Some("secret"), None),
            Err(AuthError::InvalidApiKey)
        );
    }

    #[test]
    fn test_caller_from_headers() {
        let caller = Caller::from_headers(
            Some(" reviewer "),
            Some("can_mark_as_checked, delete_everything"),
        );
        assert_eq!(caller.username(), Some("reviewer"));
        assert!(caller.capabilities().contains(Capability::CanMarkAsChecked));
        assert!(!caller.capabilities().contains(Capability::CanMarkAsMarked));
        assert_eq!(caller.require_username(), Ok("reviewer"));
    }

    #[test]
    fn test_anonymous_caller_cannot_write() {
        let caller = Caller::from_headers(Some("   "), None);
        assert_eq!(caller, Caller::anonymous());
        assert_eq!(caller.require_username(), Err(AuthError::MissingUsername));
        assert!(caller.capabilities().is_empty());
    }
}
