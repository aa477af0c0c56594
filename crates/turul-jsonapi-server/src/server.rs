//! HTTP transport for a [`ServeMux`]
//!
//! Each accepted connection is served by hyper's HTTP/1 implementation. Request
//! bodies are buffered up to the configured limit, then the synchronous dispatch
//! runs on tokio's blocking pool so callbacks may touch blocking stores.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::mux::{ServeMux, ServeMuxBuilder, bare_response, render_failure};
use crate::path::strip_base_path;
use crate::{CorsLayer, Result};

/// Configuration for the JSON:API HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_address: SocketAddr,
    /// URL prefix under which the endpoints are mounted
    pub base_path: String,
    /// Enable CORS
    pub enable_cors: bool,
    /// Origin allowed with credentials; `None` allows any origin
    pub cors_origin: Option<String>,
    /// Maximum request body size
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8000)),
            base_path: "/".to_string(),
            enable_cors: cfg!(feature = "cors"),
            cors_origin: None,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Builder for the JSON:API HTTP server
#[derive(Debug, Default)]
pub struct JsonApiServerBuilder {
    config: ServerConfig,
    registry: ServeMuxBuilder,
}

impl JsonApiServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.config.bind_address = addr;
        self
    }

    /// Set the URL prefix the endpoints are mounted under
    pub fn base_path(mut self, path: impl Into<String>) -> Self {
        self.config.base_path = path.into();
        self
    }

    /// Enable or disable CORS
    pub fn cors(mut self, enable: bool) -> Self {
        self.config.enable_cors = enable;
        self
    }

    /// Restrict CORS to a single origin, allowing credentials
    pub fn cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.config.cors_origin = Some(origin.into());
        self
    }

    /// Set maximum request body size
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    /// Register endpoint callbacks on the underlying mux builder
    ///
    /// ```rust,no_run
    /// use turul_jsonapi_server::prelude::*;
    ///
    /// let server = JsonApiServer::builder()
    ///     .register(|mux| {
    ///         mux.handle_fetch_collection("issues", |res, _ctx| {
    ///             res.append_data(Resource::new("", "1"));
    ///         })
    ///     })
    ///     .build();
    /// ```
    pub fn register<F>(mut self, register: F) -> Self
    where
        F: FnOnce(ServeMuxBuilder) -> ServeMuxBuilder,
    {
        self.registry = register(self.registry);
        self
    }

    /// Freeze the registry and build the server
    pub fn build(self) -> JsonApiServer {
        JsonApiServer::new(self.config, self.registry.build())
    }
}

/// JSON:API server serving a frozen [`ServeMux`] over HTTP/1
#[derive(Debug, Clone)]
pub struct JsonApiServer {
    config: Arc<ServerConfig>,
    mux: ServeMux,
}

impl JsonApiServer {
    pub fn new(config: ServerConfig, mux: ServeMux) -> Self {
        Self {
            config: Arc::new(config),
            mux,
        }
    }

    pub fn builder() -> JsonApiServerBuilder {
        JsonApiServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn mux(&self) -> &ServeMux {
        &self.mux
    }

    /// Bind the configured address and serve until the listener fails
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.bind_address).await?;
        self.serve(listener).await
    }

    /// Serve connections accepted from `listener`
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        info!("JSON:API server listening on {}", listener.local_addr()?);
        info!("Endpoints mounted at: {}", self.config.base_path);

        loop {
            let (stream, peer_addr) = listener.accept().await?;
            debug!("New connection from {}", peer_addr);

            let server = self.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let server = server.clone();
                    async move { server.handle_request(req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    if err.is_incomplete_message() {
                        debug!("Client disconnected (normal): {}", err);
                    } else {
                        error!("Error serving connection: {}", err);
                    }
                }
            });
        }
    }

    async fn handle_request(
        &self,
        req: Request<Incoming>,
    ) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
        let mut response = self.respond(req).await;
        if self.config.enable_cors {
            match &self.config.cors_origin {
                Some(origin) => {
                    CorsLayer::apply_cors_headers_for_origin(response.headers_mut(), origin)
                }
                None => CorsLayer::apply_cors_headers(response.headers_mut()),
            }
        }
        Ok(response.map(Full::new))
    }

    async fn respond(&self, req: Request<Incoming>) -> Response<Bytes> {
        if self.config.enable_cors && *req.method() == Method::OPTIONS {
            return bare_response(StatusCode::NO_CONTENT);
        }

        let Some(path) = strip_base_path(&self.config.base_path, req.uri().path()) else {
            debug!("{} is outside {}", req.uri().path(), self.config.base_path);
            return bare_response(StatusCode::NOT_FOUND);
        };

        let (parts, body) = req.into_parts();
        let body = match Limited::new(body, self.config.max_body_size).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
                warn!(
                    "Request body exceeds {} bytes for {}",
                    self.config.max_body_size, parts.uri
                );
                return bare_response(StatusCode::PAYLOAD_TOO_LARGE);
            }
            Err(err) => {
                warn!("Failed to read request body: {}", err);
                return bare_response(StatusCode::BAD_REQUEST);
            }
        };
        let request = Request::from_parts(parts, body);

        let mux = self.mux.clone();
        match tokio::task::spawn_blocking(move || mux.serve_at(&request, &path)).await {
            Ok(response) => response,
            Err(err) => {
                error!("Dispatch task failed: {}", err);
                render_failure()
            }
        }
    }
}
