//! Relationships of a resource object

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{DocumentError, Identifier, Linkage, Links, Meta, Result};

/// A single relationship: its linkage plus optional links and meta
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub data: Linkage,
    #[serde(default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,
    #[serde(default, skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
}

/// Relationships keyed by relationship name
///
/// Linkage is usually accumulated across several calls while a handler walks its
/// related records. Writing a to-one value over a to-many value (or the reverse)
/// keeps the latest write but reports the conflict to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Relationships(BTreeMap<String, Relationship>);

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a to-one identifier under `name`
    pub fn set_to_one(
        &mut self,
        name: impl Into<String>,
        resource_type: impl Into<String>,
        id: impl Into<String>,
        meta: Option<Meta>,
    ) -> Result<()> {
        let name = name.into();
        let relationship = self.0.entry(name.clone()).or_default();
        if let Some(meta) = meta {
            relationship.meta.extend(meta);
        }

        let previous = std::mem::replace(
            &mut relationship.data,
            Linkage::ToOne(Identifier::new(resource_type, id)),
        );
        match previous {
            Linkage::ToMany(_) => Err(DocumentError::LinkageConflict {
                relationship: name,
                existing: previous.kind(),
                requested: "to-one",
            }),
            _ => Ok(()),
        }
    }

    /// Append an identifier to the to-many linkage under `name`, preserving call order
    pub fn append_to_many(
        &mut self,
        name: impl Into<String>,
        resource_type: impl Into<String>,
        id: impl Into<String>,
        meta: Option<Meta>,
    ) -> Result<()> {
        let name = name.into();
        let relationship = self.0.entry(name.clone()).or_default();
        if let Some(meta) = meta {
            relationship.meta.extend(meta);
        }

        let identifier = Identifier::new(resource_type, id);
        match &mut relationship.data {
            Linkage::ToMany(identifiers) => {
                identifiers.push(identifier);
                Ok(())
            }
            Linkage::Empty => {
                relationship.data = Linkage::ToMany(vec![identifier]);
                Ok(())
            }
            Linkage::ToOne(_) => {
                relationship.data = Linkage::ToMany(vec![identifier]);
                Err(DocumentError::LinkageConflict {
                    relationship: name,
                    existing: "to-one",
                    requested: "to-many",
                })
            }
        }
    }

    /// Mark `name` as an empty to-many relationship (encoded as `[]`)
    pub fn set_empty_to_many(&mut self, name: impl Into<String>) {
        self.0.entry(name.into()).or_default().data = Linkage::ToMany(Vec::new());
    }

    pub fn set_links(&mut self, name: impl Into<String>, links: Links) {
        self.0.entry(name.into()).or_default().links = links;
    }

    pub fn insert(&mut self, name: impl Into<String>, relationship: Relationship) {
        self.0.insert(name.into(), relationship);
    }

    pub fn get(&self, name: &str) -> Option<&Relationship> {
        self.0.get(name)
    }

    pub fn linkage(&self, name: &str) -> Option<&Linkage> {
        self.0.get(name).map(|relationship| &relationship.data)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Relationship)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Relationship)> for Relationships {
    fn from_iter<I: IntoIterator<Item = (String, Relationship)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
