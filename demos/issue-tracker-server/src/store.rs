//! In-memory issue and people store behind the endpoints

use std::collections::BTreeMap;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use turul_jsonapi_document::{
    DocumentError, ErrorObject, Identifier, Link, Links, Linkage, Relationships, Resource,
    ToErrorObject,
};

/// Resource types the `issues` endpoint stores
pub const ISSUE_KINDS: [&str; 3] = ["bug", "feature", "chore"];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} '{id}' does not exist")]
    NotFound { kind: &'static str, id: String },

    #[error("issues have no relationship named '{0}'")]
    UnknownRelationship(String),

    #[error("relationship '{relationship}' expects {expected}")]
    InvalidLinkage {
        relationship: String,
        expected: &'static str,
    },

    #[error("invalid attributes: {0}")]
    InvalidAttributes(#[source] DocumentError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl ToErrorObject for StoreError {
    fn to_error_object(&self) -> ErrorObject {
        match self {
            StoreError::NotFound { .. } | StoreError::UnknownRelationship(_) => {
                ErrorObject::not_found(self.to_string())
            }
            StoreError::InvalidLinkage { .. } => {
                ErrorObject::conflict(self.to_string()).with_pointer("/data")
            }
            StoreError::InvalidAttributes(_) => {
                ErrorObject::new(StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
                    .with_pointer("/data/attributes")
            }
            StoreError::Document(err) => ErrorObject::from_error(err),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueAttributes {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub closed: bool,
}

/// Attributes of a PATCH; absent members keep their stored value
#[derive(Debug, Default, Deserialize)]
pub struct IssuePatch {
    pub title: Option<String>,
    pub desc: Option<String>,
    pub closed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonAttributes {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Issue {
    pub id: String,
    pub kind: String,
    pub attributes: IssueAttributes,
    pub author: Option<String>,
    pub watchers: Vec<String>,
}

impl Issue {
    /// Resource object for this issue, with links rooted at `base_path`
    pub fn to_resource(&self, base_path: &str) -> StoreResult<Resource> {
        let self_path = format!("{}/issues/{}", base_path.trim_end_matches('/'), self.id);
        let mut relationships = Relationships::new();
        if let Some(author) = &self.author {
            relationships.set_to_one("author", "people", author, None)?;
        }
        if self.watchers.is_empty() {
            relationships.set_empty_to_many("watchers");
        }
        for watcher in &self.watchers {
            relationships.append_to_many("watchers", "people", watcher, None)?;
        }
        for relationship in ["author", "watchers"] {
            relationships.set_links(relationship, relationship_links(&self_path, relationship));
        }

        let mut links = Links::new();
        links.insert("self".to_string(), Link::url(self_path));

        Ok(Resource::new(&self.kind, &self.id)
            .with_attributes(&self.attributes)?
            .with_relationships(relationships)
            .with_links(links))
    }
}

fn relationship_links(self_path: &str, relationship: &str) -> Links {
    let mut links = Links::new();
    links.insert(
        "self".to_string(),
        Link::url(format!("{}/relationships/{}", self_path, relationship)),
    );
    links.insert(
        "related".to_string(),
        Link::url(format!("{}/{}", self_path, relationship)),
    );
    links
}

#[derive(Debug, Clone)]
pub struct Person {
    pub id: String,
    pub attributes: PersonAttributes,
}

impl Person {
    pub fn to_resource(&self) -> StoreResult<Resource> {
        Ok(Resource::new("people", &self.id).with_attributes(&self.attributes)?)
    }
}

#[derive(Debug, Default)]
pub struct IssueStore {
    base_path: String,
    issues: BTreeMap<String, Issue>,
    people: BTreeMap<String, Person>,
}

impl IssueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose resource links are rooted at the server's mount prefix
    pub fn with_base_path(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues.values()
    }

    pub fn issue(&self, id: &str) -> StoreResult<&Issue> {
        self.issues.get(id).ok_or_else(|| StoreError::NotFound {
            kind: "issue",
            id: id.to_string(),
        })
    }

    /// Resource object for the issue `id`, linked under the store's base path
    pub fn issue_resource(&self, id: &str) -> StoreResult<Resource> {
        self.issue(id)?.to_resource(&self.base_path)
    }

    pub fn people(&self) -> impl Iterator<Item = &Person> {
        self.people.values()
    }

    pub fn person(&self, id: &str) -> StoreResult<&Person> {
        self.people.get(id).ok_or_else(|| StoreError::NotFound {
            kind: "person",
            id: id.to_string(),
        })
    }

    pub fn add_issue(
        &mut self,
        kind: impl Into<String>,
        attributes: IssueAttributes,
        author: Option<String>,
    ) -> StoreResult<&Issue> {
        if let Some(author) = &author {
            self.person(author)?;
        }
        let id = uuid::Uuid::new_v4().to_string();
        let issue = Issue {
            id: id.clone(),
            kind: kind.into(),
            attributes,
            author,
            watchers: Vec::new(),
        };
        Ok(self.issues.entry(id).or_insert(issue))
    }

    pub fn update_issue(
        &mut self,
        id: &str,
        kind: &str,
        patch: IssuePatch,
    ) -> StoreResult<&Issue> {
        let issue = self.issues.get_mut(id).ok_or_else(|| StoreError::NotFound {
            kind: "issue",
            id: id.to_string(),
        })?;
        issue.kind = kind.to_string();
        if let Some(title) = patch.title {
            issue.attributes.title = title;
        }
        if let Some(desc) = patch.desc {
            issue.attributes.desc = desc;
        }
        if let Some(closed) = patch.closed {
            issue.attributes.closed = closed;
        }
        Ok(issue)
    }

    pub fn remove_issue(&mut self, id: &str) -> StoreResult<Issue> {
        self.issues.remove(id).ok_or_else(|| StoreError::NotFound {
            kind: "issue",
            id: id.to_string(),
        })
    }

    pub fn add_person(&mut self, attributes: PersonAttributes) -> &Person {
        let id = uuid::Uuid::new_v4().to_string();
        let person = Person {
            id: id.clone(),
            attributes,
        };
        self.people.entry(id).or_insert(person)
    }

    /// Replace the linkage of an issue relationship
    pub fn replace_relationship(
        &mut self,
        id: &str,
        relationship: &str,
        linkage: &Linkage,
    ) -> StoreResult<&Issue> {
        let people: Vec<String> = match (relationship, linkage) {
            ("author", Linkage::ToMany(_)) | ("watchers", Linkage::ToOne(_)) => {
                return Err(StoreError::InvalidLinkage {
                    relationship: relationship.to_string(),
                    expected: if relationship == "author" {
                        "a single person or null"
                    } else {
                        "an array of people"
                    },
                });
            }
            ("author" | "watchers", linkage) => linkage_people(relationship, linkage)?,
            (other, _) => return Err(StoreError::UnknownRelationship(other.to_string())),
        };
        for person in &people {
            self.person(person)?;
        }

        let issue = self.issues.get_mut(id).ok_or_else(|| StoreError::NotFound {
            kind: "issue",
            id: id.to_string(),
        })?;
        if relationship == "author" {
            issue.author = people.into_iter().next();
        } else {
            issue.watchers = people;
        }
        Ok(issue)
    }

    /// Identifiers currently linked under `relationship`
    pub fn relationship(&self, id: &str, relationship: &str) -> StoreResult<Linkage> {
        let issue = self.issue(id)?;
        match relationship {
            "author" => Ok(issue
                .author
                .as_ref()
                .map(|author| Linkage::ToOne(Identifier::new("people", author)))
                .unwrap_or_default()),
            "watchers" => Ok(Linkage::ToMany(
                issue
                    .watchers
                    .iter()
                    .map(|watcher| Identifier::new("people", watcher))
                    .collect(),
            )),
            other => Err(StoreError::UnknownRelationship(other.to_string())),
        }
    }
}

fn linkage_people(relationship: &str, linkage: &Linkage) -> StoreResult<Vec<String>> {
    let identifiers: Vec<&Identifier> = match linkage {
        Linkage::Empty => Vec::new(),
        Linkage::ToOne(identifier) => vec![identifier],
        Linkage::ToMany(identifiers) => identifiers.iter().collect(),
    };
    identifiers
        .into_iter()
        .map(|identifier| {
            if identifier.resource_type == "people" {
                Ok(identifier.id.clone())
            } else {
                Err(StoreError::InvalidLinkage {
                    relationship: relationship.to_string(),
                    expected: "people",
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attributes(title: &str) -> IssueAttributes {
        IssueAttributes {
            title: title.to_string(),
            desc: String::new(),
            closed: false,
        }
    }

    #[test]
    fn test_issue_resource_carries_relationships() {
        let mut store = IssueStore::new();
        let author = store
            .add_person(PersonAttributes {
                name: "Ada".to_string(),
            })
            .id
            .clone();
        let issue = store
            .add_issue("bug", attributes("crash"), Some(author.clone()))
            .unwrap()
            .clone();

        let resource = issue.to_resource(store.base_path()).unwrap();
        assert_eq!(resource.resource_type, "bug");
        assert_eq!(
            resource.relationships.linkage("author"),
            Some(&Linkage::ToOne(Identifier::new("people", author)))
        );
        assert_eq!(
            resource.relationships.linkage("watchers"),
            Some(&Linkage::ToMany(Vec::new()))
        );
    }

    #[test]
    fn test_links_follow_base_path() {
        let mut store = IssueStore::with_base_path("/api/");
        let issue = store.add_issue("bug", attributes("crash"), None).unwrap().clone();
        let resource = issue.to_resource(store.base_path()).unwrap();

        let self_path = format!("/api/issues/{}", issue.id);
        assert_eq!(resource.links.get("self"), Some(&Link::url(self_path.clone())));

        let author = resource.relationships.get("author").unwrap();
        assert_eq!(
            author.links.get("self"),
            Some(&Link::url(format!("{}/relationships/author", self_path)))
        );
        assert_eq!(
            author.links.get("related"),
            Some(&Link::url(format!("{}/author", self_path)))
        );
        assert_eq!(author.data, Linkage::Empty);
    }

    #[test]
    fn test_title_defaults_when_absent() {
        let attributes: IssueAttributes =
            serde_json::from_value(serde_json::json!({"desc": "cold tea"})).unwrap();
        assert_eq!(attributes.title, "");
        assert_eq!(attributes.desc, "cold tea");
    }

    #[test]
    fn test_unknown_author_is_rejected() {
        let mut store = IssueStore::new();
        let err = store
            .add_issue("bug", attributes("crash"), Some("nobody".to_string()))
            .unwrap_err();
        assert_eq!(err.to_error_object().status, 404);
    }

    #[test]
    fn test_replace_watchers() {
        let mut store = IssueStore::new();
        let ada = store
            .add_person(PersonAttributes {
                name: "Ada".to_string(),
            })
            .id
            .clone();
        let id = store.add_issue("chore", attributes("tidy"), None).unwrap().id.clone();

        let linkage = Linkage::ToMany(vec![Identifier::new("people", ada.clone())]);
        store.replace_relationship(&id, "watchers", &linkage).unwrap();
        assert_eq!(store.issue(&id).unwrap().watchers, vec![ada]);

        let err = store
            .replace_relationship(&id, "watchers", &Linkage::ToOne(Identifier::new("people", "x")))
            .unwrap_err();
        assert_eq!(err.to_error_object().status, 409);
    }

    #[test]
    fn test_clear_author_with_null() {
        let mut store = IssueStore::new();
        let ada = store
            .add_person(PersonAttributes {
                name: "Ada".to_string(),
            })
            .id
            .clone();
        let id = store.add_issue("bug", attributes("crash"), Some(ada)).unwrap().id.clone();

        store.replace_relationship(&id, "author", &Linkage::Empty).unwrap();
        assert_eq!(store.relationship(&id, "author").unwrap(), Linkage::Empty);
    }
}
