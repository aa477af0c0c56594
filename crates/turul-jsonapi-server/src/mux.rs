//! Endpoint registry and request dispatch
//!
//! A [`ServeMuxBuilder`] collects callbacks per endpoint and is frozen into an
//! immutable [`ServeMux`] by [`ServeMuxBuilder::build`]. The mux routes a request
//! by its path segments:
//!
//! ```text
//! GET    /{type}                                  fetch collection
//! POST   /{type}                                  create
//! GET    /{type}/{id}                             fetch one
//! PATCH  /{type}/{id}                             update
//! DELETE /{type}/{id}                             delete
//! GET    /{type}/{id}/{relation}                  fetch related
//! GET    /{type}/{id}/relationships/{relation}    fetch relationship
//! PATCH  /{type}/{id}/relationships/{relation}    update relationship
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method, Request, Response, StatusCode};
use tracing::{debug, error, warn};
use turul_jsonapi_document::{
    CONTENT_TYPE as JSONAPI_MEDIA_TYPE, ErrorObject, RelationshipRequestData,
    ResourceRequestData, ToErrorObject, TopLevelDocument,
};

use crate::endpoint::{EndpointHandler, RequestContext, Route};
use crate::error::DispatchError;
use crate::negotiation::negotiate;
use crate::path::shift_path;
use crate::responder::{
    CreateResponder, DeleteResponder, FetchCollectionResponder, FetchOneResponder,
    FetchRelatedResponder, FetchRelationshipResponder, UpdateRelationshipResponder,
    UpdateResponder,
};

/// Detail of the error document substituted when a response cannot be encoded
pub const RENDER_FAILURE_DETAIL: &str = "response could not be rendered";

/// Collects endpoint callbacks before serving starts
#[derive(Debug, Default)]
pub struct ServeMuxBuilder {
    endpoints: HashMap<String, EndpointHandler>,
}

impl ServeMuxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn endpoint(&mut self, endpoint: impl Into<String>) -> &mut EndpointHandler {
        self.endpoints.entry(endpoint.into()).or_default()
    }

    /// Register the callback for `GET /{endpoint}`
    pub fn handle_fetch_collection<F>(mut self, endpoint: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut FetchCollectionResponder<'_>, &RequestContext<'_>) + Send + Sync + 'static,
    {
        self.endpoint(endpoint).fetch_collection = Some(Arc::new(handler));
        self
    }

    /// Register the callback for `GET /{endpoint}/{id}`
    pub fn handle_fetch_one<F>(mut self, endpoint: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut FetchOneResponder<'_>, &RequestContext<'_>, &str) + Send + Sync + 'static,
    {
        self.endpoint(endpoint).fetch_one = Some(Arc::new(handler));
        self
    }

    /// Register the callback for `GET /{endpoint}/{id}/{relation}`
    pub fn handle_fetch_related<F>(mut self, endpoint: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut FetchRelatedResponder<'_>, &RequestContext<'_>, &str, &str)
            + Send
            + Sync
            + 'static,
    {
        self.endpoint(endpoint).fetch_related = Some(Arc::new(handler));
        self
    }

    /// Register the callback for `GET /{endpoint}/{id}/relationships/{relation}`
    pub fn handle_fetch_relationship<F>(mut self, endpoint: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut FetchRelationshipResponder<'_>, &RequestContext<'_>, &str, &str)
            + Send
            + Sync
            + 'static,
    {
        self.endpoint(endpoint).fetch_relationship = Some(Arc::new(handler));
        self
    }

    /// Register the callback for `POST /{endpoint}`.
    ///
    /// The callback only runs once the body decoded, its type is accepted by the
    /// endpoint and any client-generated id is permitted.
    pub fn handle_create<F>(mut self, endpoint: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut CreateResponder<'_>, &RequestContext<'_>, ResourceRequestData)
            + Send
            + Sync
            + 'static,
    {
        self.endpoint(endpoint).create = Some(Arc::new(handler));
        self
    }

    /// Register the callback for `PATCH /{endpoint}/{id}`
    pub fn handle_update<F>(mut self, endpoint: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut UpdateResponder<'_>, &RequestContext<'_>, &str, ResourceRequestData)
            + Send
            + Sync
            + 'static,
    {
        self.endpoint(endpoint).update = Some(Arc::new(handler));
        self
    }

    /// Register the callback for `PATCH /{endpoint}/{id}/relationships/{relation}`
    pub fn handle_update_relationship<F>(mut self, endpoint: impl Into<String>, handler: F) -> Self
    where
        F: Fn(
                &mut UpdateRelationshipResponder<'_>,
                &RequestContext<'_>,
                &str,
                &str,
                RelationshipRequestData,
            ) + Send
            + Sync
            + 'static,
    {
        self.endpoint(endpoint).update_relationship = Some(Arc::new(handler));
        self
    }

    /// Register the callback for `DELETE /{endpoint}/{id}`
    pub fn handle_delete<F>(mut self, endpoint: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut DeleteResponder<'_>, &RequestContext<'_>, &str) + Send + Sync + 'static,
    {
        self.endpoint(endpoint).delete = Some(Arc::new(handler));
        self
    }

    /// Allow create requests for `endpoint` to carry their own `id`
    pub fn permit_client_generated_id(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint(endpoint).permit_client_generated_id = true;
        self
    }

    /// Resource types a create or update body may declare for `endpoint`.
    ///
    /// Without this call only the endpoint name itself is accepted.
    pub fn accept_types<I, T>(mut self, endpoint: impl Into<String>, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.endpoint(endpoint)
            .accepted_types
            .extend(types.into_iter().map(Into::into));
        self
    }

    /// Freeze the registry
    pub fn build(self) -> ServeMux {
        for (name, handler) in &self.endpoints {
            debug!("Registered endpoint '{}': {:?}", name, handler.operations());
        }
        ServeMux {
            endpoints: Arc::new(self.endpoints),
        }
    }
}

/// Immutable endpoint registry that turns requests into JSON:API responses
#[derive(Debug, Clone, Default)]
pub struct ServeMux {
    endpoints: Arc<HashMap<String, EndpointHandler>>,
}

impl ServeMux {
    pub fn builder() -> ServeMuxBuilder {
        ServeMuxBuilder::new()
    }

    /// Names of the registered endpoints
    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    pub fn has_endpoint(&self, endpoint: &str) -> bool {
        self.endpoints.contains_key(endpoint)
    }

    /// Serve `request` using its own URI path
    pub fn serve(&self, request: &Request<Bytes>) -> Response<Bytes> {
        self.serve_at(request, request.uri().path())
    }

    /// Serve `request` as if its path were `path`, for muxes mounted below a prefix
    pub fn serve_at(&self, request: &Request<Bytes>, path: &str) -> Response<Bytes> {
        debug!("Handling {} {}", request.method(), path);

        if let Err(err) = negotiate(request.headers()) {
            debug!("Content negotiation failed: {}", err);
            return bare_response(err.status());
        }

        let (endpoint, rest) = shift_path(path);
        if endpoint.is_empty() {
            return jsonapi_response(StatusCode::OK, Bytes::from_static(b"{}"));
        }

        let Some(handler) = self.endpoints.get(&endpoint) else {
            debug!("No endpoint registered for '{}'", endpoint);
            return jsonapi_response(StatusCode::NOT_FOUND, Bytes::new());
        };

        let route = match resolve_route(request.method(), &endpoint, &rest) {
            Ok(route) => route,
            Err(err) => return dispatch_error_response(&err),
        };
        debug!("Routed {} {} to {}", request.method(), path, route.name());

        let context = RequestContext::new(&endpoint, request);
        match dispatch(handler, &context, route) {
            Ok(response) => response,
            Err(err) => dispatch_error_response(&err),
        }
    }
}

/// Resolve the operation addressed by `method` and the path below the endpoint
pub fn resolve_route(method: &Method, endpoint: &str, path: &str) -> Result<Route, DispatchError> {
    let method_not_allowed = || DispatchError::MethodNotAllowed {
        method: method.to_string(),
        endpoint: endpoint.to_string(),
    };
    let unknown_route = || DispatchError::UnknownRoute {
        method: method.to_string(),
        path: format!("/{}{}", endpoint, path),
    };

    let (id, rest) = shift_path(path);
    if id.is_empty() {
        return match *method {
            Method::GET => Ok(Route::FetchCollection),
            Method::POST => Ok(Route::Create),
            _ => Err(method_not_allowed()),
        };
    }

    let (segment, rest) = shift_path(&rest);
    if segment.is_empty() {
        return match *method {
            Method::GET => Ok(Route::FetchOne { id }),
            Method::PATCH => Ok(Route::Update { id }),
            Method::DELETE => Ok(Route::Delete { id }),
            _ => Err(method_not_allowed()),
        };
    }

    if segment == "relationships" {
        let (relation, rest) = shift_path(&rest);
        if relation.is_empty() || rest != "/" {
            return Err(unknown_route());
        }
        return match *method {
            Method::GET => Ok(Route::FetchRelationship { id, relation }),
            Method::PATCH => Ok(Route::UpdateRelationship { id, relation }),
            _ => Err(method_not_allowed()),
        };
    }

    if rest != "/" {
        return Err(unknown_route());
    }
    match *method {
        Method::GET => Ok(Route::FetchRelated {
            id,
            relation: segment,
        }),
        _ => Err(method_not_allowed()),
    }
}

fn dispatch(
    handler: &EndpointHandler,
    context: &RequestContext<'_>,
    route: Route,
) -> Result<Response<Bytes>, DispatchError> {
    let endpoint = context.endpoint();
    let method_not_allowed = || DispatchError::MethodNotAllowed {
        method: context.method().to_string(),
        endpoint: endpoint.to_string(),
    };
    let mut document = TopLevelDocument::new();

    match route {
        Route::FetchCollection => {
            let callback = handler.fetch_collection.as_ref().ok_or_else(method_not_allowed)?;
            document.set_data_collection();
            callback(&mut FetchCollectionResponder::new(&mut document), context);
        }
        Route::FetchOne { id } => {
            let callback = handler.fetch_one.as_ref().ok_or_else(method_not_allowed)?;
            callback(&mut FetchOneResponder::new(&mut document), context, &id);
        }
        Route::FetchRelated { id, relation } => {
            let callback = handler.fetch_related.as_ref().ok_or_else(method_not_allowed)?;
            callback(
                &mut FetchRelatedResponder::new(&mut document),
                context,
                &id,
                &relation,
            );
        }
        Route::FetchRelationship { id, relation } => {
            let callback = handler
                .fetch_relationship
                .as_ref()
                .ok_or_else(method_not_allowed)?;
            callback(
                &mut FetchRelationshipResponder::new(&mut document),
                context,
                &id,
                &relation,
            );
        }
        Route::Create => {
            let callback = handler.create.as_ref().ok_or_else(method_not_allowed)?;
            let data = decode_resource(handler, endpoint, context.body(), None)?;
            callback(&mut CreateResponder::new(&mut document), context, data);
            return Ok(render(document, endpoint, StatusCode::CREATED));
        }
        Route::Update { id } => {
            let callback = handler.update.as_ref().ok_or_else(method_not_allowed)?;
            let data = decode_resource(handler, endpoint, context.body(), Some(&id))?;
            callback(&mut UpdateResponder::new(&mut document), context, &id, data);
        }
        Route::UpdateRelationship { id, relation } => {
            let callback = handler
                .update_relationship
                .as_ref()
                .ok_or_else(method_not_allowed)?;
            let data = RelationshipRequestData::from_slice(context.body())
                .map_err(|err| DispatchError::MalformedBody(err.to_string()))?;
            callback(
                &mut UpdateRelationshipResponder::new(&mut document),
                context,
                &id,
                &relation,
                data,
            );
        }
        Route::Delete { id } => {
            let callback = handler.delete.as_ref().ok_or_else(method_not_allowed)?;
            callback(&mut DeleteResponder::new(&mut document), context, &id);
            return Ok(render_delete(document, endpoint));
        }
    }

    Ok(render(document, endpoint, StatusCode::OK))
}

/// Decode a create or update body and check it against the endpoint's options.
///
/// `url_id` is the id from the URL on update and `None` on create.
fn decode_resource(
    handler: &EndpointHandler,
    endpoint: &str,
    body: &[u8],
    url_id: Option<&str>,
) -> Result<ResourceRequestData, DispatchError> {
    let data = ResourceRequestData::from_slice(body)
        .map_err(|err| DispatchError::MalformedBody(err.to_string()))?;

    match (url_id, data.id()) {
        (None, Some(_)) if !handler.permits_client_generated_id() => {
            return Err(DispatchError::ClientGeneratedId(endpoint.to_string()));
        }
        (Some(url), Some(body)) if url != body => {
            return Err(DispatchError::IdMismatch {
                url: url.to_string(),
                body: body.to_string(),
            });
        }
        _ => {}
    }

    if !handler.accepts_type(endpoint, data.resource_type()) {
        return Err(DispatchError::TypeMismatch {
            found: data.resource_type().to_string(),
        });
    }
    Ok(data)
}

/// Encode the document a callback populated
///
/// Errors take precedence over data and pick the status through the errors policy.
/// A document that fails to encode is replaced by a generic 500 error document.
fn render(mut document: TopLevelDocument, endpoint: &str, default_status: StatusCode) -> Response<Bytes> {
    let status = if document.has_errors() {
        document.errors_status()
    } else {
        document.inherit_type(endpoint);
        default_status
    };

    match document.to_vec() {
        Ok(body) => jsonapi_response(status, Bytes::from(body)),
        Err(err) => {
            error!("Failed to encode response for endpoint '{}': {}", endpoint, err);
            render_failure()
        }
    }
}

fn render_delete(document: TopLevelDocument, endpoint: &str) -> Response<Bytes> {
    if document.has_errors() {
        return render(document, endpoint, StatusCode::OK);
    }
    if document.meta().is_empty() {
        return jsonapi_response(StatusCode::NO_CONTENT, Bytes::new());
    }

    match serde_json::to_vec(&serde_json::json!({ "meta": document.meta() })) {
        Ok(body) => jsonapi_response(StatusCode::OK, Bytes::from(body)),
        Err(err) => {
            error!("Failed to encode delete meta for endpoint '{}': {}", endpoint, err);
            render_failure()
        }
    }
}

pub(crate) fn render_failure() -> Response<Bytes> {
    let mut document = TopLevelDocument::new();
    document.append_error(ErrorObject::internal_error(RENDER_FAILURE_DETAIL));
    let body = document.to_vec().unwrap_or_else(|err| {
        error!("Failed to encode fallback error document: {}", err);
        Vec::new()
    });
    jsonapi_response(StatusCode::INTERNAL_SERVER_ERROR, Bytes::from(body))
}

fn dispatch_error_response(err: &DispatchError) -> Response<Bytes> {
    if err.is_routing() {
        debug!("Routing failed: {}", err);
        return jsonapi_response(err.status(), Bytes::new());
    }

    warn!("Rejected request: {}", err);
    let mut document = TopLevelDocument::new();
    document.append_error(err.to_error_object());
    match document.to_vec() {
        Ok(body) => jsonapi_response(err.status(), Bytes::from(body)),
        Err(encode_err) => {
            error!("Failed to encode rejection: {}", encode_err);
            render_failure()
        }
    }
}

fn jsonapi_response(status: StatusCode, body: Bytes) -> Response<Bytes> {
    let mut response = bare_response(status);
    *response.body_mut() = body;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSONAPI_MEDIA_TYPE));
    response
}

pub(crate) fn bare_response(status: StatusCode) -> Response<Bytes> {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status;
    response
}
