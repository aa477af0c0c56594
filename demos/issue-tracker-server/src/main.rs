//! Issue Tracker JSON:API Server
//!
//! Serves two endpoints from an in-memory store:
//!
//! - `issues`: resources of type `bug`, `feature` or `chore`, with an `author`
//!   (to-one) and `watchers` (to-many) relationship to `people`
//! - `people`: resources of type `people`
//!
//! ```bash
//! curl -H 'Accept: application/vnd.api+json' \
//!      -H 'Content-Type: application/vnd.api+json' \
//!      -d '{"data":{"type":"bug","attributes":{"title":"crash on save"}}}' \
//!      http://127.0.0.1:8000/issues
//! ```

mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use parking_lot::RwLock;
use tracing::info;
use tracing_subscriber::EnvFilter;
use turul_jsonapi_server::prelude::*;

use crate::store::{
    ISSUE_KINDS, IssueAttributes, IssuePatch, IssueStore, PersonAttributes, StoreError,
};

type SharedStore = Arc<RwLock<IssueStore>>;

#[derive(Parser)]
#[command(name = "issue-tracker-server")]
#[command(about = "JSON:API issue tracker backed by an in-memory store")]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// URL prefix the endpoints are mounted under
    #[arg(long, default_value = "/")]
    base_path: String,

    /// Disable CORS headers
    #[arg(long)]
    no_cors: bool,

    /// Allow only this origin, with credentials, instead of any origin
    #[arg(long)]
    cors_origin: Option<String>,

    /// Maximum request body size in bytes
    #[arg(long, default_value_t = 1024 * 1024)]
    max_body_size: usize,
}

/// Write a relationship's linkage as resource identifier objects
macro_rules! respond_with_linkage {
    ($res:expr, $linkage:expr) => {
        match $linkage {
            Linkage::Empty => {}
            Linkage::ToOne(identifier) => $res.set_identifier(identifier.resource_type, identifier.id),
            Linkage::ToMany(identifiers) => {
                $res.set_data_collection();
                for identifier in identifiers {
                    $res.append_identifier(identifier.resource_type, identifier.id);
                }
            }
        }
    };
}

fn register_issues(mux: ServeMuxBuilder, store: &SharedStore) -> ServeMuxBuilder {
    let list = Arc::clone(store);
    let fetch = Arc::clone(store);
    let related = Arc::clone(store);
    let relationship = Arc::clone(store);
    let create = Arc::clone(store);
    let update = Arc::clone(store);
    let update_relationship = Arc::clone(store);
    let delete = Arc::clone(store);

    mux.accept_types("issues", ISSUE_KINDS)
        .handle_fetch_collection("issues", move |res, _ctx| {
            let store = list.read();
            for issue in store.issues() {
                match issue.to_resource(store.base_path()) {
                    Ok(resource) => res.append_data(resource),
                    Err(err) => res.append_error(err.to_error_object()),
                }
            }
        })
        .handle_fetch_one("issues", move |res, _ctx, id| {
            let store = fetch.read();
            match store.issue_resource(id) {
                Ok(resource) => res.set_data(resource),
                Err(err) => res.append_error(err.to_error_object()),
            }
        })
        .handle_fetch_related("issues", move |res, _ctx, id, relation| {
            let store = related.read();
            let linkage = match store.relationship(id, relation) {
                Ok(linkage) => linkage,
                Err(err) => return res.append_error(err.to_error_object()),
            };
            if linkage.is_to_many() {
                res.set_data_collection();
            }
            let people = linkage
                .to_one()
                .into_iter()
                .chain(linkage.to_many())
                .map(|identifier| store.person(&identifier.id).and_then(|person| person.to_resource()));
            for person in people {
                match person {
                    Ok(resource) if linkage.is_to_many() => res.append_data(resource),
                    Ok(resource) => res.set_data(resource),
                    Err(err) => res.append_error(err.to_error_object()),
                }
            }
        })
        .handle_fetch_relationship("issues", move |res, _ctx, id, relation| {
            match relationship.read().relationship(id, relation) {
                Ok(linkage) => respond_with_linkage!(res, linkage),
                Err(err) => res.append_error(err.to_error_object()),
            }
        })
        .handle_create("issues", move |res, _ctx, data| {
            let attributes: IssueAttributes = match data.attributes_as() {
                Ok(attributes) => attributes,
                Err(err) => return res.append_error(StoreError::InvalidAttributes(err).to_error_object()),
            };
            let author = data
                .data
                .relationships
                .linkage("author")
                .and_then(Linkage::to_one)
                .map(|identifier| identifier.id.clone());

            let mut store = create.write();
            let created = store
                .add_issue(data.resource_type(), attributes, author)
                .map(|issue| issue.id.clone())
                .and_then(|id| store.issue_resource(&id));
            match created {
                Ok(resource) => {
                    info!("Created {} {}", resource.resource_type, resource.id);
                    res.set_data(resource);
                }
                Err(err) => res.append_error(err.to_error_object()),
            }
        })
        .handle_update("issues", move |res, _ctx, id, data| {
            let patch: IssuePatch = match data.attributes_as() {
                Ok(patch) => patch,
                Err(err) => return res.append_error(StoreError::InvalidAttributes(err).to_error_object()),
            };
            let mut store = update.write();
            match store
                .update_issue(id, data.resource_type(), patch)
                .map(|_| ())
                .and_then(|()| store.issue_resource(id))
            {
                Ok(resource) => res.set_data(resource),
                Err(err) => res.append_error(err.to_error_object()),
            }
        })
        .handle_update_relationship("issues", move |res, _ctx, id, relation, data| {
            let mut store = update_relationship.write();
            let replaced = store
                .replace_relationship(id, relation, &data.data)
                .map(|_| ())
                .and_then(|()| store.relationship(id, relation));
            match replaced {
                Ok(linkage) => respond_with_linkage!(res, linkage),
                Err(err) => res.append_error(err.to_error_object()),
            }
        })
        .handle_delete("issues", move |res, _ctx, id| {
            if let Err(err) = delete.write().remove_issue(id) {
                res.append_error(err.to_error_object());
            } else {
                info!("Deleted issue {}", id);
            }
        })
}

fn register_people(mux: ServeMuxBuilder, store: &SharedStore) -> ServeMuxBuilder {
    let list = Arc::clone(store);
    let fetch = Arc::clone(store);
    let create = Arc::clone(store);

    mux.handle_fetch_collection("people", move |res, _ctx| {
        let store = list.read();
        for person in store.people() {
            match person.to_resource() {
                Ok(resource) => res.append_data(resource),
                Err(err) => res.append_error(err.to_error_object()),
            }
        }
    })
    .handle_fetch_one("people", move |res, _ctx, id| {
        let store = fetch.read();
        match store.person(id).and_then(|person| person.to_resource()) {
            Ok(resource) => res.set_data(resource),
            Err(err) => res.append_error(err.to_error_object()),
        }
    })
    .handle_create("people", move |res, _ctx, data| {
        let attributes: PersonAttributes = match data.attributes_as() {
            Ok(attributes) => attributes,
            Err(err) => return res.append_error(StoreError::InvalidAttributes(err).to_error_object()),
        };
        let mut store = create.write();
        match store.add_person(attributes).to_resource() {
            Ok(resource) => res.set_data(resource),
            Err(err) => res.append_error(err.to_error_object()),
        }
    })
}

fn seed(store: &SharedStore) -> Result<(), StoreError> {
    let mut store = store.write();
    let ada = store
        .add_person(PersonAttributes {
            name: "Ada".to_string(),
        })
        .id
        .clone();
    store.add_issue(
        "bug",
        IssueAttributes {
            title: "Crash when saving an empty draft".to_string(),
            desc: String::new(),
            closed: false,
        },
        Some(ada),
    )?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let store: SharedStore = Arc::new(RwLock::new(IssueStore::with_base_path(&args.base_path)));
    seed(&store)?;

    let mut builder = JsonApiServer::builder()
        .bind_address(args.bind)
        .base_path(args.base_path)
        .cors(!args.no_cors)
        .max_body_size(args.max_body_size);
    if let Some(origin) = args.cors_origin {
        builder = builder.cors_origin(origin);
    }
    let server = builder
        .register(|mux| register_people(register_issues(mux, &store), &store))
        .build();

    info!("Issue tracker serving issues and people");
    server.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Method, Response, StatusCode};
    use serde_json::{Value, json};

    fn tracker(base_path: &str) -> (SharedStore, ServeMux) {
        let store: SharedStore = Arc::new(RwLock::new(IssueStore::with_base_path(base_path)));
        let mux = register_people(register_issues(ServeMuxBuilder::new(), &store), &store).build();
        (store, mux)
    }

    fn send(mux: &ServeMux, method: Method, uri: &str, body: Option<Value>) -> Response<Bytes> {
        let body = body.map(|body| Bytes::from(body.to_string())).unwrap_or_default();
        mux.serve(&jsonapi_request(method, uri).body(body).unwrap())
    }

    fn body_json(response: &Response<Bytes>) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    fn create(mux: &ServeMux, uri: &str, body: Value) -> String {
        let response = send(mux, Method::POST, uri, Some(body));
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(&response)["data"]["id"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_create_bug_with_description_only() {
        let (_store, mux) = tracker("/");

        let response = send(
            &mux,
            Method::POST,
            "/issues",
            Some(json!({"data": {"type": "bug", "attributes": {"desc": "cold tea"}}})),
        );
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(&response);
        let id = body["data"]["id"].as_str().unwrap();
        assert_eq!(body["data"]["type"], "bug");
        assert_eq!(body["data"]["attributes"]["desc"], "cold tea");
        assert_eq!(body["data"]["attributes"]["title"], "");
        assert_eq!(body["data"]["links"]["self"], format!("/issues/{}", id));
    }

    #[test]
    fn test_list_mixed_issue_kinds() {
        let (_store, mux) = tracker("/");
        create(&mux, "/issues", json!({"data": {"type": "bug", "attributes": {"title": "crash"}}}));
        create(&mux, "/issues", json!({"data": {"type": "chore", "attributes": {"title": "tidy"}}}));

        let rejected = send(
            &mux,
            Method::POST,
            "/issues",
            Some(json!({"data": {"type": "issues", "attributes": {"title": "typo"}}})),
        );
        assert_eq!(rejected.status(), StatusCode::CONFLICT);

        let response = send(&mux, Method::GET, "/issues", None);
        assert_eq!(response.status(), StatusCode::OK);
        let mut kinds: Vec<String> = body_json(&response)["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|issue| issue["type"].as_str().unwrap().to_string())
            .collect();
        kinds.sort();
        assert_eq!(kinds, vec!["bug", "chore"]);
    }

    #[test]
    fn test_update_and_delete_issue() {
        let (_store, mux) = tracker("/");
        let id = create(&mux, "/issues", json!({"data": {"type": "bug", "attributes": {"title": "crash"}}}));
        let uri = format!("/issues/{}", id);

        let response = send(
            &mux,
            Method::PATCH,
            &uri,
            Some(json!({"data": {"type": "feature", "id": id.clone(), "attributes": {"closed": true}}})),
        );
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(&response);
        assert_eq!(body["data"]["type"], "feature");
        assert_eq!(body["data"]["attributes"]["title"], "crash");
        assert_eq!(body["data"]["attributes"]["closed"], true);

        let response = send(&mux, Method::DELETE, &uri, None);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(send(&mux, Method::GET, &uri, None).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_relationship_flow() {
        let (store, mux) = tracker("/api");
        let ada = create(&mux, "/people", json!({"data": {"type": "people", "attributes": {"name": "Ada"}}}));
        let id = create(
            &mux,
            "/issues",
            json!({"data": {
                "type": "bug",
                "attributes": {"title": "crash"},
                "relationships": {"author": {"data": {"type": "people", "id": ada.clone()}}}
            }}),
        );

        let issue = body_json(&send(&mux, Method::GET, &format!("/issues/{}", id), None));
        assert_eq!(issue["data"]["links"]["self"], format!("/api/issues/{}", id));
        assert_eq!(
            issue["data"]["relationships"]["author"]["links"]["related"],
            format!("/api/issues/{}/author", id)
        );

        let response = send(&mux, Method::GET, &format!("/issues/{}/relationships/author", id), None);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(&response)["data"], json!({"type": "people", "id": ada.clone()}));

        let response = send(&mux, Method::GET, &format!("/issues/{}/author", id), None);
        assert_eq!(body_json(&response)["data"]["attributes"]["name"], "Ada");

        let response = send(
            &mux,
            Method::PATCH,
            &format!("/issues/{}/relationships/watchers", id),
            Some(json!({"data": [{"type": "people", "id": ada.clone()}]})),
        );
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(&response)["data"],
            json!([{"type": "people", "id": ada.clone()}])
        );

        let response = send(&mux, Method::GET, &format!("/issues/{}/watchers", id), None);
        assert_eq!(body_json(&response)["data"][0]["attributes"]["name"], "Ada");

        let response = send(
            &mux,
            Method::PATCH,
            &format!("/issues/{}/relationships/author", id),
            Some(json!({"data": null})),
        );
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(store.read().issue(&id).unwrap().author, None);

        let response = send(&mux, Method::GET, &format!("/issues/{}/labels", id), None);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
