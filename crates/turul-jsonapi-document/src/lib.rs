//! # JSON:API Document Model
//!
//! A pure, transport-agnostic implementation of the JSON:API top-level document.
//! This crate provides the types that are written into a response and read out of
//! a request body, without any HTTP server code.
//!
//! ## Features
//! - Resource objects with late-bound `type` inheritance from the serving endpoint
//! - Relationship linkage that reports conflicting to-one/to-many writes
//! - Error objects and the policy that rolls several errors into one HTTP status
//! - Polymorphic primary data (`{}`, single object, or array) chosen at encode time

pub mod document;
pub mod error;
pub mod link;
pub mod linkage;
pub mod member;
pub mod prelude;
pub mod relationship;
pub mod request;
pub mod resource;

// Re-export main types
pub use document::{PrimaryData, TopLevelDocument};
pub use error::{DocumentError, ErrorObject, ErrorSource, ToErrorObject, errors_policy};
pub use link::{Link, LinkObject};
pub use linkage::{Identifier, Linkage};
pub use member::validate_member_name;
pub use relationship::{Relationship, Relationships};
pub use request::{RelationshipRequestData, ResourceObject, ResourceRequestData, jsonapi_request};
pub use resource::{Resource, Resources};

/// Media type used in the `Accept` and `Content-Type` headers
pub const CONTENT_TYPE: &str = "application/vnd.api+json";

/// Non-standard meta-information attached to documents, resources and links
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// A links object keyed by link name
pub type Links = std::collections::BTreeMap<String, Link>;

/// Result type for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;
