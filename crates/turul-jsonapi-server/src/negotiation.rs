//! Content negotiation gate
//!
//! Both `Accept` and `Content-Type` must carry the JSON:API media type on every
//! request, including a `GET` without a body. Clients of this server rely on the
//! uniform check, so it runs before any routing.

use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use thiserror::Error;
use turul_jsonapi_document::CONTENT_TYPE as JSONAPI_MEDIA_TYPE;

/// Why a request failed content negotiation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    #[error("Accept header '{0}' does not allow application/vnd.api+json")]
    NotAcceptable(String),

    #[error("Content-Type header '{0}' is not application/vnd.api+json")]
    UnsupportedMediaType(String),
}

impl NegotiationError {
    pub fn status(&self) -> StatusCode {
        match self {
            NegotiationError::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            NegotiationError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }
}

/// Extract the `Accept` header value, empty when missing or not visible ASCII
pub fn extract_accept(headers: &HeaderMap) -> &str {
    headers
        .get(ACCEPT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("")
}

/// Extract the `Content-Type` header value, empty when missing or not visible ASCII
pub fn extract_content_type(headers: &HeaderMap) -> &str {
    headers
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("")
}

/// Check `Accept` first (406), then `Content-Type` (415)
pub fn negotiate(headers: &HeaderMap) -> Result<(), NegotiationError> {
    let accept = extract_accept(headers);
    if !accept.starts_with(JSONAPI_MEDIA_TYPE) {
        return Err(NegotiationError::NotAcceptable(accept.to_string()));
    }

    let content_type = extract_content_type(headers);
    if !content_type.starts_with(JSONAPI_MEDIA_TYPE) {
        return Err(NegotiationError::UnsupportedMediaType(content_type.to_string()));
    }
    Ok(())
}
