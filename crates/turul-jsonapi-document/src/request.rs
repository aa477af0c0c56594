use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CONTENT_TYPE, Linkage, Relationships, Result};

/// Resource object sent by a client to create or update a resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceObject {
    /// Client-generated id (create) or the id being updated (update)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Value>,
    #[serde(default, skip_serializing_if = "Relationships::is_empty")]
    pub relationships: Relationships,
}

/// Request body of a create or update: `{"data": {...}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequestData {
    pub data: ResourceObject,
}

impl ResourceRequestData {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Client-generated id, treating an empty string as absent
    pub fn id(&self) -> Option<&str> {
        self.data.id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn resource_type(&self) -> &str {
        &self.data.resource_type
    }

    /// Decode `attributes` into a struct or map; missing attributes decode from `{}`
    pub fn attributes_as<T: DeserializeOwned>(&self) -> Result<T> {
        let attributes = self
            .data
            .attributes
            .clone()
            .unwrap_or_else(|| Value::Object(Default::default()));
        Ok(serde_json::from_value(attributes)?)
    }
}

/// Request body of a relationship update: `{"data": <linkage>}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRequestData {
    #[serde(default)]
    pub data: Linkage,
}

impl RelationshipRequestData {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }
}

/// Request builder with `Accept` and `Content-Type` set to the JSON:API media type
pub fn jsonapi_request(method: http::Method, uri: &str) -> http::request::Builder {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::ACCEPT, CONTENT_TYPE)
        .header(http::header::CONTENT_TYPE, CONTENT_TYPE)
}
