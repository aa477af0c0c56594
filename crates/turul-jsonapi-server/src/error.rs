//! Routing and request-shape failures detected before a callback runs

use http::StatusCode;
use thiserror::Error;
use turul_jsonapi_document::{ErrorObject, ToErrorObject};

/// Reasons the router refuses to hand a request to a callback
///
/// Routing failures (`UnknownRoute`, `MethodNotAllowed`) answer with an empty body.
/// Request-shape failures answer with an error document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no route for {method} {path}")]
    UnknownRoute { method: String, path: String },

    #[error("{method} is not implemented for endpoint '{endpoint}'")]
    MethodNotAllowed { method: String, endpoint: String },

    #[error("request body could not be decoded: {0}")]
    MalformedBody(String),

    #[error("client-generated ids are not permitted for endpoint '{0}'")]
    ClientGeneratedId(String),

    #[error("'{found}' is not among the type(s) that constitute the collection represented by the endpoint")]
    TypeMismatch { found: String },

    #[error("id '{body}' in the request body does not match id '{url}' in the URL")]
    IdMismatch { url: String, body: String },
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::UnknownRoute { .. } => StatusCode::NOT_FOUND,
            DispatchError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            DispatchError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            DispatchError::ClientGeneratedId(_) => StatusCode::FORBIDDEN,
            DispatchError::TypeMismatch { .. } | DispatchError::IdMismatch { .. } => {
                StatusCode::CONFLICT
            }
        }
    }

    /// Routing failures are answered without a document
    pub fn is_routing(&self) -> bool {
        matches!(
            self,
            DispatchError::UnknownRoute { .. } | DispatchError::MethodNotAllowed { .. }
        )
    }
}

impl ToErrorObject for DispatchError {
    fn to_error_object(&self) -> ErrorObject {
        let error = ErrorObject::new(self.status(), self.to_string());
        match self {
            DispatchError::MalformedBody(_) => error.with_pointer(""),
            DispatchError::ClientGeneratedId(_) => error.with_pointer("/data/id"),
            DispatchError::TypeMismatch { .. } => error.with_pointer("/data/type"),
            DispatchError::IdMismatch { .. } => error.with_pointer("/data/id"),
            _ => error,
        }
    }
}
