//! Mapping of core and auth errors onto HTTP responses.
//!
//! Every error body is `{"message": "..."}`.

use api_shared::wire::MessageRes;
use api_shared::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lawmark_core::{CoreError, CoreResult, ErrorKind};

pub const INVALID_STATUS_MESSAGE: &str = "Invalid status";
pub const FORBIDDEN_STATUS_MESSAGE: &str =
    "You do not have permission to change this document's status";
pub const INVALID_PAGE_MESSAGE: &str = "Invalid page.";

#[derive(Debug)]
pub enum ApiError {
    Core(CoreError),
    Auth(AuthError),
    Internal(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Core(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Core(err) => match err.kind() {
                ErrorKind::Validation => match err {
                    CoreError::InvalidStatus(_) | CoreError::UndefinedTransition { .. } => {
                        (StatusCode::BAD_REQUEST, INVALID_STATUS_MESSAGE.into())
                    }
                    other => (StatusCode::BAD_REQUEST, other.to_string()),
                },
                ErrorKind::Forbidden => (StatusCode::FORBIDDEN, FORBIDDEN_STATUS_MESSAGE.into()),
                ErrorKind::NotFound => match err {
                    CoreError::InvalidPage(_) => {
                        (StatusCode::NOT_FOUND, INVALID_PAGE_MESSAGE.into())
                    }
                    other => (StatusCode::NOT_FOUND, other.to_string()),
                },
                ErrorKind::Storage => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into())
                }
            },
            ApiError::Auth(err) => (StatusCode::UNAUTHORIZED, err.to_string()),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            match &self {
                ApiError::Core(err) => tracing::error!("request failed: {:?}", err),
                ApiError::Internal(detail) => tracing::error!("request failed: {}", detail),
                ApiError::Auth(_) => {}
            }
        }
        (status, Json(MessageRes::new(message))).into_response()
    }
}

/// Runs a synchronous core operation on the blocking pool.
pub(crate) async fn blocking<T, F>(op: F) -> Result<T, ApiError>
where
    F: FnOnce() -> CoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))?
        .map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lawmark_core::{Capability, DocumentStatus};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::from(CoreError::InvalidStatus("BOGUS".into())),
                StatusCode::BAD_REQUEST,
                INVALID_STATUS_MESSAGE,
            ),
            (
                ApiError::from(CoreError::UndefinedTransition {
                    from: DocumentStatus::Unmarked,
                    to: DocumentStatus::Unmarked,
                }),
                StatusCode::BAD_REQUEST,
                INVALID_STATUS_MESSAGE,
            ),
            (
                ApiError::from(CoreError::Forbidden {
                    required: Capability::CanMarkAsChecked,
                    requested: DocumentStatus::Checked,
                }),
                StatusCode::FORBIDDEN,
                FORBIDDEN_STATUS_MESSAGE,
            ),
            (
                ApiError::from(CoreError::InvalidPage(4)),
                StatusCode::NOT_FOUND,
                INVALID_PAGE_MESSAGE,
            ),
            (
                ApiError::from(AuthError::MissingUsername),
                StatusCode::UNAUTHORIZED,
                "Authentication credentials were not provided.",
            ),
        ];

        for (err, status, message) in cases {
            assert_eq!(err.status_and_message(), (status, message.to_string()));
        }
    }

    #[test]
    fn test_not_found_and_storage_mapping() {
        let (status, _) = ApiError::from(CoreError::DocumentNotFound(3)).status_and_message();
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, message) =
            ApiError::from(CoreError::InvalidTimestamp(-1)).status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal error");
    }
}
