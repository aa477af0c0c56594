//! Links, encoded either as a bare URL string or as a link object

use serde::de::Deserializer;
use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};

use crate::{DocumentError, Meta};

/// Link object form: `{"href": ..., "meta": ...}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkObject {
    pub href: String,
    #[serde(default, skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
}

/// A JSON:API link
///
/// The format does not define an empty link, so a link with neither a URL nor an
/// `href` refuses to serialize.
#[derive(Debug, Clone, PartialEq)]
pub enum Link {
    Url(String),
    Object(LinkObject),
}

impl Link {
    pub fn url(url: impl Into<String>) -> Self {
        Link::Url(url.into())
    }

    pub fn object(href: impl Into<String>, meta: Meta) -> Self {
        Link::Object(LinkObject {
            href: href.into(),
            meta,
        })
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Link::Url(url) => url.is_empty(),
            Link::Object(object) => object.href.is_empty(),
        }
    }

    pub fn href(&self) -> &str {
        match self {
            Link::Url(url) => url,
            Link::Object(object) => &object.href,
        }
    }
}

impl Default for Link {
    fn default() -> Self {
        Link::Url(String::new())
    }
}

impl Serialize for Link {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_empty() {
            return Err(S::Error::custom(DocumentError::EmptyLink));
        }
        match self {
            Link::Url(url) => serializer.serialize_str(url),
            Link::Object(object) => object.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Link {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Url(String),
            Object(LinkObject),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Url(url) => Ok(Link::Url(url)),
            Wire::Object(object) => Ok(Link::Object(object)),
        }
    }
}

impl From<&str> for Link {
    fn from(url: &str) -> Self {
        Link::Url(url.to_string())
    }
}

impl From<String> for Link {
    fn from(url: String) -> Self {
        Link::Url(url)
    }
}
