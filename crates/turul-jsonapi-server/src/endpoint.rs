//! Endpoint registry entries and the callbacks they dispatch to

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method, Request, Uri};
use turul_jsonapi_document::{RelationshipRequestData, ResourceRequestData};

use crate::responder::{
    CreateResponder, DeleteResponder, FetchCollectionResponder, FetchOneResponder,
    FetchRelatedResponder, FetchRelationshipResponder, UpdateRelationshipResponder,
    UpdateResponder,
};

/// Request-scoped values passed to every callback
///
/// `endpoint` is the resource-type name the router resolved from the first path
/// segment. It is also the type inherited by resources left without one.
#[derive(Clone, Copy)]
pub struct RequestContext<'a> {
    endpoint: &'a str,
    request: &'a Request<Bytes>,
}

impl<'a> RequestContext<'a> {
    pub fn new(endpoint: &'a str, request: &'a Request<Bytes>) -> Self {
        Self { endpoint, request }
    }

    pub fn endpoint(&self) -> &'a str {
        self.endpoint
    }

    pub fn request(&self) -> &'a Request<Bytes> {
        self.request
    }

    pub fn method(&self) -> &'a Method {
        self.request.method()
    }

    pub fn uri(&self) -> &'a Uri {
        self.request.uri()
    }

    pub fn headers(&self) -> &'a HeaderMap {
        self.request.headers()
    }

    pub fn body(&self) -> &'a Bytes {
        self.request.body()
    }
}

impl fmt::Debug for RequestContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("endpoint", &self.endpoint)
            .field("method", self.request.method())
            .field("uri", self.request.uri())
            .finish()
    }
}

pub type FetchCollectionHandler =
    Arc<dyn Fn(&mut FetchCollectionResponder<'_>, &RequestContext<'_>) + Send + Sync>;

pub type FetchOneHandler =
    Arc<dyn Fn(&mut FetchOneResponder<'_>, &RequestContext<'_>, &str) + Send + Sync>;

pub type FetchRelatedHandler =
    Arc<dyn Fn(&mut FetchRelatedResponder<'_>, &RequestContext<'_>, &str, &str) + Send + Sync>;

pub type FetchRelationshipHandler = Arc<
    dyn Fn(&mut FetchRelationshipResponder<'_>, &RequestContext<'_>, &str, &str) + Send + Sync,
>;

pub type CreateHandler =
    Arc<dyn Fn(&mut CreateResponder<'_>, &RequestContext<'_>, ResourceRequestData) + Send + Sync>;

pub type UpdateHandler = Arc<
    dyn Fn(&mut UpdateResponder<'_>, &RequestContext<'_>, &str, ResourceRequestData) + Send + Sync,
>;

pub type UpdateRelationshipHandler = Arc<
    dyn Fn(
            &mut UpdateRelationshipResponder<'_>,
            &RequestContext<'_>,
            &str,
            &str,
            RelationshipRequestData,
        ) + Send
        + Sync,
>;

pub type DeleteHandler =
    Arc<dyn Fn(&mut DeleteResponder<'_>, &RequestContext<'_>, &str) + Send + Sync>;

/// Callbacks and options registered for one endpoint
///
/// A missing callback means the matching operation answers 405.
#[derive(Clone, Default)]
pub struct EndpointHandler {
    pub(crate) fetch_collection: Option<FetchCollectionHandler>,
    pub(crate) fetch_one: Option<FetchOneHandler>,
    pub(crate) fetch_related: Option<FetchRelatedHandler>,
    pub(crate) fetch_relationship: Option<FetchRelationshipHandler>,
    pub(crate) create: Option<CreateHandler>,
    pub(crate) update: Option<UpdateHandler>,
    pub(crate) update_relationship: Option<UpdateRelationshipHandler>,
    pub(crate) delete: Option<DeleteHandler>,
    pub(crate) permit_client_generated_id: bool,
    pub(crate) accepted_types: BTreeSet<String>,
}

impl EndpointHandler {
    /// Whether a request body of `resource_type` belongs to the collection served by `endpoint`
    pub fn accepts_type(&self, endpoint: &str, resource_type: &str) -> bool {
        if self.accepted_types.is_empty() {
            resource_type == endpoint
        } else {
            self.accepted_types.contains(resource_type)
        }
    }

    pub fn permits_client_generated_id(&self) -> bool {
        self.permit_client_generated_id
    }

    /// Names of the operations with a registered callback, for logging
    pub fn operations(&self) -> Vec<&'static str> {
        let mut operations = Vec::new();
        if self.fetch_collection.is_some() {
            operations.push("fetch_collection");
        }
        if self.fetch_one.is_some() {
            operations.push("fetch_one");
        }
        if self.fetch_related.is_some() {
            operations.push("fetch_related");
        }
        if self.fetch_relationship.is_some() {
            operations.push("fetch_relationship");
        }
        if self.create.is_some() {
            operations.push("create");
        }
        if self.update.is_some() {
            operations.push("update");
        }
        if self.update_relationship.is_some() {
            operations.push("update_relationship");
        }
        if self.delete.is_some() {
            operations.push("delete");
        }
        operations
    }
}

impl fmt::Debug for EndpointHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointHandler")
            .field("operations", &self.operations())
            .field("permit_client_generated_id", &self.permit_client_generated_id)
            .field("accepted_types", &self.accepted_types)
            .finish()
    }
}

/// An operation resolved from the method and the path below the endpoint segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    FetchCollection,
    Create,
    FetchOne { id: String },
    Update { id: String },
    Delete { id: String },
    FetchRelated { id: String, relation: String },
    FetchRelationship { id: String, relation: String },
    UpdateRelationship { id: String, relation: String },
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Route::FetchCollection => "fetch_collection",
            Route::Create => "create",
            Route::FetchOne { .. } => "fetch_one",
            Route::Update { .. } => "update",
            Route::Delete { .. } => "delete",
            Route::FetchRelated { .. } => "fetch_related",
            Route::FetchRelationship { .. } => "fetch_relationship",
            Route::UpdateRelationship { .. } => "update_relationship",
        }
    }
}
