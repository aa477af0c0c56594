//! # JSON:API Server Prelude
//!
//! Everything needed to register endpoints and serve them, including the
//! document types callbacks write into.
//!
//! ```rust
//! use turul_jsonapi_server::prelude::*;
//! ```

pub use crate::endpoint::RequestContext;
pub use crate::mux::{ServeMux, ServeMuxBuilder};
pub use crate::responder::{
    CreateResponder, DeleteResponder, FetchCollectionResponder, FetchOneResponder,
    FetchRelatedResponder, FetchRelationshipResponder, UpdateRelationshipResponder,
    UpdateResponder,
};
pub use crate::server::{JsonApiServer, JsonApiServerBuilder, ServerConfig};
pub use crate::{DispatchError, JsonApiServerError};

pub use turul_jsonapi_document::prelude::*;
