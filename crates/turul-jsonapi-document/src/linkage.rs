//! Resource linkage: the to-one/to-many payload of a relationship

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Resource identifier object, naming a resource without embedding it
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
}

impl Identifier {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
        }
    }
}

/// Linkage of a single relationship
///
/// Encodes as `null` when empty, an identifier object when to-one, and an array
/// (possibly empty) when to-many.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Linkage {
    #[default]
    Empty,
    ToOne(Identifier),
    ToMany(Vec<Identifier>),
}

impl Linkage {
    pub fn is_empty(&self) -> bool {
        matches!(self, Linkage::Empty)
    }

    pub fn is_to_many(&self) -> bool {
        matches!(self, Linkage::ToMany(_))
    }

    pub fn to_one(&self) -> Option<&Identifier> {
        match self {
            Linkage::ToOne(identifier) => Some(identifier),
            _ => None,
        }
    }

    pub fn to_many(&self) -> &[Identifier] {
        match self {
            Linkage::ToMany(identifiers) => identifiers,
            _ => &[],
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Linkage::Empty => "empty",
            Linkage::ToOne(_) => "to-one",
            Linkage::ToMany(_) => "to-many",
        }
    }
}

impl From<Identifier> for Linkage {
    fn from(identifier: Identifier) -> Self {
        Linkage::ToOne(identifier)
    }
}

impl From<Vec<Identifier>> for Linkage {
    fn from(identifiers: Vec<Identifier>) -> Self {
        Linkage::ToMany(identifiers)
    }
}

impl Serialize for Linkage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Linkage::Empty => serializer.serialize_none(),
            Linkage::ToOne(identifier) => identifier.serialize(serializer),
            Linkage::ToMany(identifiers) => identifiers.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Linkage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            ToMany(Vec<Identifier>),
            ToOne(Identifier),
        }

        Ok(match Option::<Wire>::deserialize(deserializer)? {
            None => Linkage::Empty,
            Some(Wire::ToOne(identifier)) => Linkage::ToOne(identifier),
            Some(Wire::ToMany(identifiers)) => Linkage::ToMany(identifiers),
        })
    }
}
