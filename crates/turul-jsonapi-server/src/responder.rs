//! Response adapters handed to endpoint callbacks
//!
//! Each callback gets a narrow view of the response document that only exposes the
//! writes that make sense for its operation. A fetch-collection callback can append
//! resources but not set a single one; a delete callback can only report errors
//! and meta.

use turul_jsonapi_document::{ErrorObject, Meta, Resource, TopLevelDocument};

macro_rules! responder {
    ($(#[$attr:meta])* $name:ident { $($capability:ident),* $(,)? }) => {
        $(#[$attr])*
        pub struct $name<'a> {
            document: &'a mut TopLevelDocument,
        }

        impl<'a> $name<'a> {
            pub fn new(document: &'a mut TopLevelDocument) -> Self {
                Self { document }
            }

            /// Whether an error has already been appended to the response
            pub fn has_errors(&self) -> bool {
                self.document.has_errors()
            }

            /// Append an error; `None` leaves the response untouched
            pub fn append_error(&mut self, error: impl Into<Option<ErrorObject>>) {
                self.document.append_error(error);
            }

            /// Replace the top-level `meta` member
            pub fn set_meta(&mut self, meta: Meta) {
                self.document.set_meta(meta);
            }

            $(responder!(@capability $capability);)*
        }
    };
    (@capability set_data) => {
        /// Set the single resource returned as primary data
        pub fn set_data(&mut self, resource: Resource) {
            self.document.set_data(resource);
        }
    };
    (@capability append_data) => {
        /// Append a resource to the collection returned as primary data
        pub fn append_data(&mut self, resource: Resource) {
            self.document.append_data(resource);
        }
    };
    (@capability set_data_collection) => {
        /// Answer with a collection, encoded as `[]` if nothing is appended
        pub fn set_data_collection(&mut self) {
            self.document.set_data_collection();
        }
    };
    (@capability set_identifier) => {
        /// Set a single resource identifier object as primary data
        pub fn set_identifier(&mut self, resource_type: impl Into<String>, id: impl Into<String>) {
            self.document.set_identifier(resource_type, id);
        }
    };
    (@capability append_identifier) => {
        /// Append a resource identifier object to the primary data collection
        pub fn append_identifier(&mut self, resource_type: impl Into<String>, id: impl Into<String>) {
            self.document.append_identifier(resource_type, id);
        }
    };
    (@capability include) => {
        /// Side-load a related resource into `included`
        pub fn include(&mut self, resource: Resource) {
            self.document.include(resource);
        }
    };
}

responder! {
    /// Response to `GET /{type}`
    FetchCollectionResponder { append_data, include }
}

responder! {
    /// Response to `GET /{type}/{id}`
    FetchOneResponder { set_data, include }
}

responder! {
    /// Response to `GET /{type}/{id}/{relation}`
    FetchRelatedResponder { set_data, append_data, set_data_collection, include }
}

responder! {
    /// Response to `GET /{type}/{id}/relationships/{relation}`
    FetchRelationshipResponder { set_identifier, append_identifier, set_data_collection }
}

responder! {
    /// Response to `POST /{type}`
    CreateResponder { set_data, include }
}

responder! {
    /// Response to `PATCH /{type}/{id}`
    UpdateResponder { set_data, include }
}

responder! {
    /// Response to `PATCH /{type}/{id}/relationships/{relation}`.
    ///
    /// `set_identifier` and `append_identifier` are mutually exclusive: call the one
    /// matching whether the relationship is to-one or to-many.
    UpdateRelationshipResponder { set_identifier, append_identifier, set_data_collection }
}

responder! {
    /// Response to `DELETE /{type}/{id}`
    DeleteResponder {}
}
