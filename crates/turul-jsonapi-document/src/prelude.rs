//! # JSON:API Document Prelude
//!
//! This module provides convenient re-exports of the most commonly used types
//! from the document model.
//!
//! ```rust
//! use turul_jsonapi_document::prelude::*;
//! ```

pub use crate::document::{PrimaryData, TopLevelDocument};
pub use crate::error::{DocumentError, ErrorObject, ToErrorObject, errors_policy};
pub use crate::link::Link;
pub use crate::linkage::{Identifier, Linkage};
pub use crate::relationship::{Relationship, Relationships};
pub use crate::request::{RelationshipRequestData, ResourceRequestData, jsonapi_request};
pub use crate::resource::{Resource, Resources};
pub use crate::{CONTENT_TYPE, Links, Meta};
