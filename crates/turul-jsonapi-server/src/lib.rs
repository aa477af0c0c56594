//! # JSON:API Server
//!
//! HTTP routing for JSON:API endpoints. Applications register callbacks per
//! resource type on a [`ServeMuxBuilder`], freeze it into a [`ServeMux`], and either
//! call [`ServeMux::serve`] from their own transport or hand the mux to
//! [`JsonApiServer`] to serve it over HTTP/1.
//!
//! ## Features
//! - Content negotiation on `application/vnd.api+json` before any routing
//! - Per-operation callbacks that only see the writes valid for their operation
//! - Request-shape checks (client ids, accepted types) before a callback runs
//! - Error documents chosen over data, with one status picked by the errors policy
//! - CORS support for browser-based clients

pub mod cors;
pub mod endpoint;
pub mod error;
pub mod mux;
pub mod negotiation;
pub mod path;
pub mod prelude;
pub mod responder;
pub mod server;

#[cfg(test)]
mod tests;

// Re-export main types
pub use cors::CorsLayer;
pub use endpoint::{EndpointHandler, RequestContext, Route};
pub use error::DispatchError;
pub use mux::{RENDER_FAILURE_DETAIL, ServeMux, ServeMuxBuilder, resolve_route};
pub use negotiation::{NegotiationError, extract_accept, extract_content_type, negotiate};
pub use path::{clean_path, shift_path};
pub use responder::{
    CreateResponder, DeleteResponder, FetchCollectionResponder, FetchOneResponder,
    FetchRelatedResponder, FetchRelationshipResponder, UpdateRelationshipResponder,
    UpdateResponder,
};
pub use server::{JsonApiServer, JsonApiServerBuilder, ServerConfig};

// Re-export foundational types
pub use turul_jsonapi_document as document;

/// Result type for JSON:API server operations
pub type Result<T> = std::result::Result<T, JsonApiServerError>;

/// JSON:API server errors
///
/// Request-level failures never surface here: they are answered with a status or
/// an error document. Only binding and accepting on the listener can fail.
#[derive(Debug, thiserror::Error)]
pub enum JsonApiServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
