use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Identifier, Links, Meta, Relationships, Result};

/// Resource object as it appears in `data` or `included`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Value>,
    #[serde(default, skip_serializing_if = "Relationships::is_empty")]
    pub relationships: Relationships,
    #[serde(default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,
    #[serde(default, skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
}

impl Resource {
    /// A resource with an empty `resource_type` inherits the endpoint name when the
    /// response is encoded.
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            ..Default::default()
        }
    }

    /// Resource identifier object: only `id` and `type` are encoded
    pub fn identifier(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(resource_type, id)
    }

    /// Serialize `attributes` into the resource
    pub fn with_attributes<T: Serialize + ?Sized>(mut self, attributes: &T) -> Result<Self> {
        self.attributes = Some(serde_json::to_value(attributes)?);
        Ok(self)
    }

    pub fn with_relationships(mut self, relationships: Relationships) -> Self {
        self.relationships = relationships;
        self
    }

    pub fn with_links(mut self, links: Links) -> Self {
        self.links = links;
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    /// Fill in the type from the serving endpoint when the handler left it blank
    pub fn inherit_type(&mut self, endpoint: &str) {
        if self.resource_type.is_empty() {
            self.resource_type = endpoint.to_string();
        }
    }

    pub fn to_identifier(&self) -> Identifier {
        Identifier::new(self.resource_type.clone(), self.id.clone())
    }
}

impl From<Identifier> for Resource {
    fn from(identifier: Identifier) -> Self {
        Self::new(identifier.resource_type, identifier.id)
    }
}

/// Ordered collection of resource objects
pub type Resources = Vec<Resource>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inherit_type_when_blank() {
        let mut resource = Resource::new("", "1");
        resource.inherit_type("issues");
        assert_eq!(resource.resource_type, "issues");
    }

    #[test]
    fn test_inherit_type_keeps_explicit_type() {
        let mut resource = Resource::new("bug", "1");
        resource.inherit_type("issues");
        assert_eq!(resource.resource_type, "bug");
    }

    #[test]
    fn test_resource_serialization() {
        #[derive(Serialize)]
        struct Issue {
            desc: &'static str,
            done: bool,
        }

        let resource = Resource::new("feature", "1")
            .with_attributes(&Issue {
                desc: "As a teapot, I should pour tea",
                done: false,
            })
            .unwrap();

        assert_eq!(
            serde_json::to_value(&resource).unwrap(),
            json!({
                "id": "1",
                "type": "feature",
                "attributes": {"desc": "As a teapot, I should pour tea", "done": false}
            })
        );
    }

    #[test]
    fn test_identifier_has_no_members_beyond_id_and_type() {
        let resource = Resource::identifier("people", "9");
        assert_eq!(
            serde_json::to_value(&resource).unwrap(),
            json!({"id": "9", "type": "people"})
        );
    }
}
