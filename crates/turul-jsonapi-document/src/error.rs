use std::fmt;

use http::StatusCode;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::{Link, Links, Meta};

/// Errors raised while building or encoding a document (no transport logic)
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("relationship '{relationship}' already holds a {existing} linkage; replaced by {requested}")]
    LinkageConflict {
        relationship: String,
        existing: &'static str,
        requested: &'static str,
    },

    #[error("a link must have a string or object value")]
    EmptyLink,

    #[error("invalid member name: {0}")]
    InvalidMemberName(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where in the request an error originated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSource {
    /// JSON Pointer [RFC6901] to the offending value in the request document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
    /// Query parameter that caused the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

/// JSON:API error object
///
/// A `status` of `0` means "not specified"; [`ErrorObject::http_status`] reports it as
/// `500 Internal Server Error` and it is left out of the encoded object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<Link>,
    #[serde(
        default,
        skip_serializing_if = "status_unset",
        serialize_with = "serialize_status",
        deserialize_with = "deserialize_status"
    )]
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
    #[serde(default, skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
}

impl ErrorObject {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            detail: Some(detail.into()),
            ..Default::default()
        }
    }

    /// Wrap any error, using its message as `detail` and leaving the status unset
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        Self {
            detail: Some(error.to_string()),
            ..Default::default()
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, detail)
    }

    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.source.get_or_insert_with(ErrorSource::default).pointer = Some(pointer.into());
        self
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.source.get_or_insert_with(ErrorSource::default).parameter = Some(parameter.into());
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    /// HTTP status for this error; an unset or unknown status is a server error
    pub fn http_status(&self) -> StatusCode {
        if self.status == 0 {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(err) => write!(f, "could not encode error: {}", err),
        }
    }
}

impl std::error::Error for ErrorObject {}

impl From<DocumentError> for ErrorObject {
    fn from(error: DocumentError) -> Self {
        ErrorObject::internal_error(error.to_string())
    }
}

/// Trait for errors that can be reported as JSON:API error objects
pub trait ToErrorObject: std::error::Error + Send + Sync + 'static {
    fn to_error_object(&self) -> ErrorObject;
}

/// Reduce the errors of one operation to a single HTTP status.
///
/// An empty list is `200 OK` and a single error keeps its own status. Several
/// client errors collapse to `400`, several server errors to `500`, and any mix
/// of client and server errors is reported as `500`. Otherwise the highest
/// status wins.
pub fn errors_policy(errors: &[ErrorObject]) -> StatusCode {
    match errors {
        [] => StatusCode::OK,
        [only] => only.http_status(),
        _ => {
            let mut max = StatusCode::OK;
            let (mut client, mut server) = (0usize, 0usize);
            for status in errors.iter().map(ErrorObject::http_status) {
                if status.is_client_error() {
                    client += 1;
                } else if status.is_server_error() {
                    server += 1;
                }
                if status > max {
                    max = status;
                }
            }

            if server > 1 || (server > 0 && client > 0) {
                StatusCode::INTERNAL_SERVER_ERROR
            } else if client > 1 {
                StatusCode::BAD_REQUEST
            } else {
                max
            }
        }
    }
}

fn status_unset(status: &u16) -> bool {
    *status == 0
}

fn serialize_status<S: Serializer>(status: &u16, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&status.to_string())
}

fn deserialize_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    struct StatusVisitor;

    impl Visitor<'_> for StatusVisitor {
        type Value = u16;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an HTTP status as a string or number")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<u16, E> {
            u16::try_from(value).map_err(|_| E::custom(format!("status {} out of range", value)))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<u16, E> {
            u16::try_from(value).map_err(|_| E::custom(format!("status {} out of range", value)))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<u16, E> {
            if value.is_empty() {
                return Ok(0);
            }
            value
                .parse()
                .map_err(|_| E::custom(format!("invalid status '{}'", value)))
        }
    }

    deserializer.deserialize_any(StatusVisitor)
}
