//! The HTTP mock server: axum transport wired to the stub registry.
//!
//! Three route groups:
//! - `POST /httpmock/add` registers one stub at runtime (201 on success,
//!   400 on malformed or invalid input, 405 on any other method),
//! - `GET /httpmock/list` returns all registered stubs as a pretty-printed
//!   JSON array (405 on any other method),
//! - everything else is generic stub dispatch: exact-match against the
//!   registry, 404 on a miss.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::loader::load_stubs;
use crate::registry::StubRegistry;
use crate::stub::Stub;

/// Content type applied to stub responses that do not set their own.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// The HTTP mock server.
///
/// Owns its [`StubRegistry`]; two servers never share stub state.
///
/// # Example
///
/// ```rust,no_run
/// use httpmock_server::{MockServer, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     MockServer::with_config(ServerConfig {
///         port: 9090,
///         ..Default::default()
///     })
///     .run()
///     .await
/// }
/// ```
pub struct MockServer {
    registry: Arc<StubRegistry>,
    config: ServerConfig,
    dir_loaded: bool,
}

impl MockServer {
    /// Create a server with the default configuration. The default stubs
    /// directory is loaded when [`MockServer::run`] is called.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(StubRegistry::new()),
            config: ServerConfig::default(),
            dir_loaded: false,
        }
    }

    /// Create a server from a configuration: pre-registers `config.stubs`
    /// and loads `config.stubs_dir` immediately.
    pub fn with_config(config: ServerConfig) -> Self {
        let server = Self {
            registry: Arc::new(StubRegistry::new()),
            config,
            dir_loaded: true,
        };
        server.registry.add_all(server.config.stubs.clone());
        load_stubs(&server.registry, &server.config.stubs_dir);
        server
    }

    /// Set the listen port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Register stubs before startup. Invalid entries are logged and skipped.
    pub fn with_stubs(self, stubs: impl IntoIterator<Item = Stub>) -> Self {
        self.registry.add_all(stubs);
        self
    }

    /// Load stub definitions from a directory tree immediately. Replaces the
    /// startup auto-load of the default stubs directory.
    pub fn with_stubs_from(mut self, dir: impl AsRef<Path>) -> Self {
        load_stubs(&self.registry, dir.as_ref());
        self.dir_loaded = true;
        self
    }

    /// The registry backing this server.
    pub fn registry(&self) -> &Arc<StubRegistry> {
        &self.registry
    }

    /// The socket address the server binds to.
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.config.port))
    }

    /// Build the axum router serving the control API and generic dispatch.
    pub fn router(&self) -> Router {
        router(Arc::clone(&self.registry))
    }

    /// Load any pending stubs directory, bind the listener and serve until
    /// interrupted. Shutdown is graceful: in-flight dispatches drain before
    /// the process exits.
    pub async fn run(mut self) -> anyhow::Result<()> {
        if !self.dir_loaded {
            load_stubs(&self.registry, &self.config.stubs_dir);
            self.dir_loaded = true;
        }

        let addr = self.addr();
        let app = self.router();
        info!(%addr, stubs = self.registry.len(), "starting HTTP mock server");
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("HTTP mock server stopped");
        Ok(())
    }
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to listen for shutdown signal");
    }
}

fn router(registry: Arc<StubRegistry>) -> Router {
    Router::new()
        .route("/httpmock/add", post(add_stub))
        .route("/httpmock/list", get(list_stubs))
        .fallback(dispatch_stub)
        .with_state(registry)
}

/// `POST /httpmock/add`: decode one JSON or YAML stub and register it.
async fn add_stub(State(registry): State<Arc<StubRegistry>>, body: Bytes) -> StatusCode {
    let stub = match Stub::from_bytes(&body) {
        Ok(stub) => stub,
        Err(err) => {
            warn!(%err, "failed to parse stub definition");
            return StatusCode::BAD_REQUEST;
        }
    };
    match registry.add(stub) {
        Ok(()) => StatusCode::CREATED,
        Err(_) => StatusCode::BAD_REQUEST,
    }
}

/// `GET /httpmock/list`: all registered stubs as a pretty-printed JSON array.
async fn list_stubs(State(registry): State<Arc<StubRegistry>>) -> Response {
    let stubs = registry.list();
    match serde_json::to_string_pretty(&stubs) {
        Ok(body) => ([(header::CONTENT_TYPE, DEFAULT_CONTENT_TYPE)], body).into_response(),
        Err(err) => {
            error!(%err, "failed to serialize stubs");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Fallback route: match the inbound request against the registry.
async fn dispatch_stub(State(registry): State<Arc<StubRegistry>>, request: Request) -> Response {
    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();
    let query = parse_query(request.uri().query().unwrap_or(""));

    let body = match axum::body::to_bytes(request.into_body(), usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(%err, "failed to read request body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match registry.dispatch(&method, &path, query, &body) {
        Some(stub) => stub_response(&stub),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Build the outbound response for a matched stub: configured status first,
/// configured headers (defaulting `Content-Type`), then the JSON-serialized
/// response body.
fn stub_response(stub: &Stub) -> Response {
    let mut builder = Response::builder().status(stub.response.status_code);
    let mut has_content_type = false;
    for (name, values) in &stub.response.headers {
        if name.eq_ignore_ascii_case("content-type") {
            has_content_type = true;
        }
        for value in values {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }
    if !has_content_type {
        builder = builder.header(header::CONTENT_TYPE, DEFAULT_CONTENT_TYPE);
    }

    let body = match serde_json::to_vec(&stub.response.body) {
        Ok(body) => body,
        Err(err) => {
            error!(%err, "failed to serialize stub response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    match builder.body(Body::from(body)) {
        Ok(response) => response,
        Err(err) => {
            error!(%err, "failed to build stub response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Parse a raw query string into a multi-valued parameter map, preserving
/// the order of repeated values per key.
fn parse_query(query: &str) -> HashMap<String, Vec<String>> {
    let mut params: HashMap<String, Vec<String>> = HashMap::new();
    for part in query.split('&') {
        if part.is_empty() {
            continue;
        }
        let (key, value) = part.split_once('=').unwrap_or((part, ""));
        params
            .entry(percent_decode(key))
            .or_default()
            .push(percent_decode(value));
    }
    params
}

/// Minimal percent-decoding for query components (`%XX` escapes and `+`).
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                match (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}
