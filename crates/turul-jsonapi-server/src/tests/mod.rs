//! Test modules for turul-jsonapi-server crate
//!
//! Dispatch tests drive a [`crate::ServeMux`] directly with in-memory requests.


use bytes::Bytes;
use http::{Method, Request, Response};
use serde_json::Value;
use turul_jsonapi_document::jsonapi_request;

pub(crate) fn request(method: Method, uri: &str, body: &str) -> Request<Bytes> {
    jsonapi_request(method, uri)
        .body(Bytes::copy_from_slice(body.as_bytes()))
        .unwrap()
}

pub(crate) fn get(uri: &str) -> Request<Bytes> {
    request(Method::GET, uri, "")
}

pub(crate) fn body_json(response: &Response<Bytes>) -> Value {
    serde_json::from_slice(response.body()).unwrap()
}
