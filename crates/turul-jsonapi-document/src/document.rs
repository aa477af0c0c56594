//! Top-level document: the root object of every request and response

use serde::de::{Deserializer, Error as _};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ErrorObject, Meta, Resource, Resources, Result, errors_policy};

/// Primary data of a document
///
/// Which encoding `data` gets is decided when the document is serialized:
/// `NotSet` is an empty object, `Single` an object and `Collection` an array,
/// including the empty array for a collection nothing was appended to.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PrimaryData {
    #[default]
    NotSet,
    Single(Box<Resource>),
    Collection(Resources),
}

impl PrimaryData {
    fn resources_mut(&mut self) -> &mut [Resource] {
        match self {
            PrimaryData::NotSet => &mut [],
            PrimaryData::Single(resource) => std::slice::from_mut(resource.as_mut()),
            PrimaryData::Collection(resources) => resources,
        }
    }
}

/// JSON:API top-level document
///
/// Errors pre-empt data: once any error has been appended the document encodes as
/// `{"errors": [...], "meta": ...}` and `data`/`included` are left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopLevelDocument {
    data: PrimaryData,
    errors: Vec<ErrorObject>,
    included: Resources,
    meta: Meta,
}

impl TopLevelDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single resource as primary data, discarding any collection
    pub fn set_data(&mut self, resource: Resource) {
        self.data = PrimaryData::Single(Box::new(resource));
    }

    /// Append a resource to collection primary data, discarding any single resource
    pub fn append_data(&mut self, resource: Resource) {
        match &mut self.data {
            PrimaryData::Collection(resources) => resources.push(resource),
            data => *data = PrimaryData::Collection(vec![resource]),
        }
    }

    /// Mark the primary data as a collection so that it encodes as `[]` when empty
    pub fn set_data_collection(&mut self) {
        if !matches!(self.data, PrimaryData::Collection(_)) {
            self.data = PrimaryData::Collection(Vec::new());
        }
    }

    /// Set a single resource identifier object as primary data
    pub fn set_identifier(&mut self, resource_type: impl Into<String>, id: impl Into<String>) {
        self.set_data(Resource::identifier(resource_type, id));
    }

    /// Append a resource identifier object to collection primary data
    pub fn append_identifier(&mut self, resource_type: impl Into<String>, id: impl Into<String>) {
        self.append_data(Resource::identifier(resource_type, id));
    }

    /// Append an error; `None` leaves the document untouched
    pub fn append_error(&mut self, error: impl Into<Option<ErrorObject>>) {
        if let Some(error) = error.into() {
            self.errors.push(error);
        }
    }

    /// Side-load a related resource into `included`
    pub fn include(&mut self, resource: Resource) {
        self.included.push(resource);
    }

    pub fn set_meta(&mut self, meta: Meta) {
        self.meta = meta;
    }

    pub fn insert_meta(&mut self, key: impl Into<String>, value: Value) {
        self.meta.insert(key.into(), value);
    }

    /// Give every resource without a type the endpoint name.
    ///
    /// A resource type may differ from the endpoint it is served from, so only
    /// blank types are filled in.
    pub fn inherit_type(&mut self, endpoint: &str) {
        for resource in self.data.resources_mut() {
            resource.inherit_type(endpoint);
        }
        for resource in &mut self.included {
            resource.inherit_type(endpoint);
        }
    }

    pub fn data(&self) -> &PrimaryData {
        &self.data
    }

    pub fn errors(&self) -> &[ErrorObject] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn included(&self) -> &[Resource] {
        &self.included
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// HTTP status implied by the appended errors (`200 OK` when there are none)
    pub fn errors_status(&self) -> http::StatusCode {
        errors_policy(&self.errors)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl Serialize for TopLevelDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;

        if !self.errors.is_empty() {
            map.serialize_entry("errors", &self.errors)?;
        } else {
            match &self.data {
                PrimaryData::NotSet => map.serialize_entry("data", &Meta::new())?,
                PrimaryData::Single(resource) => map.serialize_entry("data", resource)?,
                PrimaryData::Collection(resources) => map.serialize_entry("data", resources)?,
            }
            if !self.included.is_empty() {
                map.serialize_entry("included", &self.included)?;
            }
        }

        if !self.meta.is_empty() {
            map.serialize_entry("meta", &self.meta)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TopLevelDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Wire {
            #[serde(default)]
            data: Option<Value>,
            #[serde(default)]
            errors: Vec<ErrorObject>,
            #[serde(default)]
            included: Resources,
            #[serde(default)]
            meta: Meta,
        }

        let wire = Wire::deserialize(deserializer)?;
        let data = match wire.data {
            None => PrimaryData::NotSet,
            Some(Value::Object(object)) if object.is_empty() => PrimaryData::NotSet,
            Some(value @ Value::Object(_)) => PrimaryData::Single(Box::new(
                serde_json::from_value(value).map_err(D::Error::custom)?,
            )),
            Some(value @ Value::Array(_)) => {
                PrimaryData::Collection(serde_json::from_value(value).map_err(D::Error::custom)?)
            }
            Some(other) => {
                return Err(D::Error::custom(format!(
                    "primary data must be an object or an array, got {}",
                    other
                )));
            }
        };

        Ok(Self {
            data,
            errors: wire.errors,
            included: wire.included,
            meta: wire.meta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Link;
    use serde_json::json;

    fn encode(document: &TopLevelDocument) -> Value {
        serde_json::to_value(document).unwrap()
    }

    #[test]
    fn test_unset_data_is_empty_object() {
        assert_eq!(encode(&TopLevelDocument::new()), json!({"data": {}}));
    }

    #[test]
    fn test_empty_collection_is_empty_array() {
        let mut document = TopLevelDocument::new();
        document.set_data_collection();
        assert_eq!(encode(&document), json!({"data": []}));
    }

    #[test]
    fn test_single_resource() {
        let mut document = TopLevelDocument::new();
        document.set_data(Resource::new("bug", "1"));
        assert_eq!(encode(&document), json!({"data": {"id": "1", "type": "bug"}}));
    }

    #[test]
    fn test_set_data_discards_collection() {
        let mut document = TopLevelDocument::new();
        document.append_data(Resource::new("bug", "1"));
        document.append_data(Resource::new("bug", "2"));
        document.set_data(Resource::new("bug", "3"));
        assert_eq!(encode(&document), json!({"data": {"id": "3", "type": "bug"}}));
    }

    #[test]
    fn test_append_data_discards_single() {
        let mut document = TopLevelDocument::new();
        document.set_data(Resource::new("bug", "1"));
        document.append_data(Resource::new("bug", "2"));
        assert_eq!(encode(&document), json!({"data": [{"id": "2", "type": "bug"}]}));
    }

    #[test]
    fn test_set_data_collection_keeps_appended_resources() {
        let mut document = TopLevelDocument::new();
        document.append_data(Resource::new("bug", "1"));
        document.set_data_collection();
        assert_eq!(encode(&document), json!({"data": [{"id": "1", "type": "bug"}]}));
    }

    #[test]
    fn test_append_error_none_is_ignored() {
        let mut document = TopLevelDocument::new();
        document.append_error(None);
        assert_eq!(document.errors().len(), 0);

        document.append_error(ErrorObject::default());
        assert_eq!(document.errors().len(), 1);

        document.append_error(Some(ErrorObject::not_found("missing")));
        assert_eq!(document.errors().len(), 2);
    }

    #[test]
    fn test_errors_pre_empt_data_and_included() {
        let mut document = TopLevelDocument::new();
        document.set_data(Resource::new("bug", "1"));
        document.include(Resource::new("people", "9"));
        document.insert_meta("request", json!("abc"));
        document.append_error(ErrorObject::new(http::StatusCode::UNAUTHORIZED, "no session"));

        let encoded = encode(&document);
        let keys: Vec<_> = encoded.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["errors", "meta"]);
        assert_eq!(encoded["errors"][0]["status"], "401");
        assert_eq!(document.errors_status(), http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_inherit_type_covers_data_and_included() {
        let mut document = TopLevelDocument::new();
        document.append_data(Resource::new("", "1"));
        document.append_data(Resource::new("bug", "2"));
        document.include(Resource::new("", "3"));
        document.inherit_type("issues");

        let encoded = encode(&document);
        assert_eq!(encoded["data"][0]["type"], "issues");
        assert_eq!(encoded["data"][1]["type"], "bug");
        assert_eq!(encoded["included"][0]["type"], "issues");
    }

    #[test]
    fn test_identifiers() {
        let mut document = TopLevelDocument::new();
        document.append_identifier("tag", "a");
        document.append_identifier("tag", "b");
        assert_eq!(
            encode(&document),
            json!({"data": [{"id": "a", "type": "tag"}, {"id": "b", "type": "tag"}]})
        );
    }

    #[test]
    fn test_encode_failure_surfaces() {
        let mut document = TopLevelDocument::new();
        let mut links = crate::Links::new();
        links.insert("self".to_string(), Link::default());
        document.set_data(Resource::new("bug", "1").with_links(links));
        assert!(document.to_vec().is_err());
    }

    #[test]
    fn test_deserialize_document() {
        let single: TopLevelDocument =
            serde_json::from_value(json!({"data": {"id": "1", "type": "bug"}})).unwrap();
        assert!(matches!(single.data(), PrimaryData::Single(_)));

        let collection: TopLevelDocument = serde_json::from_value(json!({"data": []})).unwrap();
        assert_eq!(collection.data(), &PrimaryData::Collection(vec![]));

        let empty: TopLevelDocument = serde_json::from_value(json!({"data": {}})).unwrap();
        assert_eq!(empty.data(), &PrimaryData::NotSet);

        let errors: TopLevelDocument =
            serde_json::from_value(json!({"errors": [{"status": "404"}]})).unwrap();
        assert_eq!(errors.errors_status(), http::StatusCode::NOT_FOUND);
    }
}
