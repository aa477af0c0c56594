//! HTTP tests against a live listener
//!
//! Each test binds `127.0.0.1:0`, serves a small mux on it and talks to it with
//! reqwest, covering what only the transport layer does: body limits, CORS and
//! the base path.

use std::net::SocketAddr;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use turul_jsonapi_server::prelude::*;

const MEDIA_TYPE: &str = "application/vnd.api+json";

fn builder() -> JsonApiServerBuilder {
    JsonApiServer::builder().register(|mux| {
        mux.accept_types("issues", ["bug", "feature", "chore"])
            .handle_fetch_collection("issues", |_res, _ctx| {})
            .handle_create("issues", |res, _ctx, data| {
                let resource = Resource::new(data.resource_type(), uuid::Uuid::new_v4().to_string());
                match data.data.attributes.as_ref() {
                    Some(attributes) => res.set_data(resource.with_attributes(attributes).unwrap()),
                    None => res.set_data(resource),
                }
            })
    })
}

async fn start(server: JsonApiServer) -> SocketAddr {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("turul_jsonapi_server=debug")
        .with_test_writer()
        .try_init();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Err(err) = server.serve(listener).await {
            tracing::error!("test server stopped: {}", err);
        }
    });
    addr
}

fn jsonapi(client: &reqwest::Client, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
    client
        .request(method, url)
        .header(ACCEPT, MEDIA_TYPE)
        .header(CONTENT_TYPE, MEDIA_TYPE)
}

#[tokio::test]
async fn test_create_over_http() {
    let addr = start(builder().build()).await;
    let client = reqwest::Client::new();

    let response = jsonapi(&client, reqwest::Method::POST, format!("http://{}/issues", addr))
        .body(json!({"data": {"type": "bug", "attributes": {"desc": "crash"}}}).to_string())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), MEDIA_TYPE);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["type"], "bug");
    assert_eq!(body["data"]["attributes"]["desc"], "crash");
    assert!(!body["data"]["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_collection_over_http() {
    let addr = start(builder().build()).await;
    let client = reqwest::Client::new();

    let response = jsonapi(&client, reqwest::Method::GET, format!("http://{}/issues", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), r#"{"data":[]}"#);
}

#[tokio::test]
async fn test_unknown_endpoint_over_http() {
    let addr = start(builder().build()).await;
    let client = reqwest::Client::new();

    let response = jsonapi(&client, reqwest::Method::GET, format!("http://{}/unknown", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_plain_client_is_not_acceptable() {
    let addr = start(builder().build()).await;

    let response = reqwest::get(format!("http://{}/issues", addr)).await.unwrap();
    assert_eq!(response.status(), 406);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let addr = start(builder().max_body_size(64).build()).await;
    let client = reqwest::Client::new();

    let desc = "x".repeat(256);
    let response = jsonapi(&client, reqwest::Method::POST, format!("http://{}/issues", addr))
        .body(json!({"data": {"type": "bug", "attributes": {"desc": desc}}}).to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 413);
}

#[tokio::test]
async fn test_cors_preflight() {
    let addr = start(builder().cors(true).build()).await;
    let client = reqwest::Client::new();

    let response = client
        .request(reqwest::Method::OPTIONS, format!("http://{}/issues", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_cors_restricted_to_origin() {
    let addr = start(builder().cors(true).cors_origin("https://tracker.example").build()).await;
    let client = reqwest::Client::new();

    let response = jsonapi(&client, reqwest::Method::GET, format!("http://{}/issues", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "https://tracker.example"
    );
    assert_eq!(
        response.headers().get("access-control-allow-credentials").unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let addr = start(builder().cors(false).build()).await;
    let client = reqwest::Client::new();

    let response = jsonapi(&client, reqwest::Method::GET, format!("http://{}/issues", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_base_path_mount() {
    let addr = start(builder().base_path("/api").build()).await;
    let client = reqwest::Client::new();

    let mounted = jsonapi(&client, reqwest::Method::GET, format!("http://{}/api/issues", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(mounted.status(), 200);

    let outside = jsonapi(&client, reqwest::Method::GET, format!("http://{}/issues", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(outside.status(), 404);
}

#[tokio::test]
async fn test_bind_failure_is_io_error() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server = builder().bind_address(taken.local_addr().unwrap()).build();

    let err = server.run().await.unwrap_err();
    assert!(matches!(err, JsonApiServerError::Io(_)));
    assert!(err.to_string().starts_with("IO error:"));
}

#[test]
fn test_default_config() {
    let config = ServerConfig::default();
    assert_eq!(config.bind_address, SocketAddr::from(([127, 0, 0, 1], 8000)));
    assert_eq!(config.base_path, "/");
    assert!(config.enable_cors);
    assert_eq!(config.cors_origin, None);
    assert_eq!(config.max_body_size, 1024 * 1024);
}
