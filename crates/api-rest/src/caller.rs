use crate::error::ApiError;
use crate::AppState;
use api_shared::auth::{validate_api_key, API_KEY_HEADER, CAPABILITIES_HEADER, USERNAME_HEADER};
use api_shared::Caller;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// The caller of a request, after the gateway API key has been checked.
///
/// Extracting this rejects requests without a valid `x-api-key` when one is configured.
pub struct RequestCaller(pub Caller);

#[async_trait]
impl FromRequestParts<AppState> for RequestCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;
        validate_api_key(state.api_key.as_deref(), header(headers, API_KEY_HEADER)).map_err(
            |err| {
                tracing::warn!("rejected request to {}: {}", parts.uri.path(), err);
                err
            },
        )?;

        Ok(RequestCaller(Caller::from_headers(
            header(headers, USERNAME_HEADER),
            header(headers, CAPABILITIES_HEADER),
        )))
    }
}
